//! Category classification.
//!
//! Rule/keyword scoring first, vision-model corroboration only when the rule
//! pass is unsure. The classifier never guesses: without a strong enough
//! signal the result is the uncategorized sentinel with zero confidence.

pub mod normalize;
pub mod rules;
pub mod vision;

use tracing::debug;

use self::rules::{PreparedText, RuleMatcher};
use self::vision::VisionClient;

/// Sentinel leaf id used when no category signal is strong enough.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Raw scores below this never win a category.
const MIN_SCORE: i64 = 5;

/// Top-two raw scores closer than this flag the result as ambiguous.
const AMBIGUITY_MARGIN: i64 = 5;

/// Raw score at which rule confidence saturates to 1.0.
const CONFIDENCE_SATURATION: f64 = 60.0;

/// Below this raw score the vision fallback is consulted.
const VISION_FALLBACK_SCORE: i64 = 10;

/// Text fields of one product. Every field may be absent.
#[derive(Debug, Default, Clone)]
pub struct ClassifyInput {
    pub name: String,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub breadcrumbs: Vec<String>,
    pub url: Option<String>,
    pub image_urls: Vec<String>,
}

/// Outcome of one classification call. Transient; only the category id is
/// ever persisted, and only by the reclassification pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category_id: String,
    /// 0..1; zero means no usable signal.
    pub confidence: f64,
    pub is_ambiguous: bool,
}

impl ClassificationResult {
    fn uncategorized() -> Self {
        Self {
            category_id: UNCATEGORIZED.to_string(),
            confidence: 0.0,
            is_ambiguous: false,
        }
    }
}

/// Rule matcher plus optional vision fallback.
pub struct Classifier {
    matcher: RuleMatcher,
    vision: Option<VisionClient>,
}

impl Classifier {
    #[must_use]
    pub fn new(matcher: RuleMatcher, vision: Option<VisionClient>) -> Self {
        Self { matcher, vision }
    }

    /// Keyword-only classification.
    #[must_use]
    pub fn classify(&self, input: &ClassifyInput) -> ClassificationResult {
        self.classify_scored(input).0
    }

    /// Classification with the vision fallback.
    ///
    /// When the rule pass is unsure and a vision client is configured, tags
    /// extracted from the first http(s) image URL are appended to the
    /// description and the rules re-run. Vision failure silently keeps the
    /// keyword-only result.
    pub async fn classify_with_vision(&self, input: &ClassifyInput) -> ClassificationResult {
        let (result, raw_score) = self.classify_scored(input);

        if raw_score >= VISION_FALLBACK_SCORE {
            return result;
        }
        let Some(vision) = &self.vision else {
            return result;
        };

        let main_image = input
            .image_urls
            .first()
            .map(String::as_str)
            .or(input.url.as_deref());
        let Some(main_image) = main_image.filter(|url| url.starts_with("http")) else {
            return result;
        };

        debug!(raw_score, "low rule confidence, consulting vision model");
        let tags = vision.analyze_image(main_image).await;
        if tags.is_empty() {
            return result;
        }

        debug!(tags = ?tags, "vision model corroboration");
        let mut enriched = input.clone();
        let description = enriched.description.unwrap_or_default();
        enriched.description = Some(format!("{description} {}", tags.join(" ")));
        self.classify_scored(&enriched).0
    }

    fn classify_scored(&self, input: &ClassifyInput) -> (ClassificationResult, i64) {
        let text = prepare_text(input);
        let scores = self.matcher.score(&text);

        let mut best_idx = None;
        let mut best = 0i64;
        let mut second = 0i64;
        for (idx, score) in scores.iter().copied().enumerate() {
            if score > best {
                second = best;
                best = score;
                best_idx = Some(idx);
            } else if score > second {
                second = score;
            }
        }

        let is_ambiguous = best > 0 && best - second < AMBIGUITY_MARGIN;

        let Some(best_idx) = best_idx.filter(|_| best >= MIN_SCORE) else {
            return (ClassificationResult::uncategorized(), best);
        };

        #[allow(clippy::cast_precision_loss)]
        let confidence = (best as f64 / CONFIDENCE_SATURATION).min(1.0);

        (
            ClassificationResult {
                category_id: self.matcher.rules()[best_idx].id.to_string(),
                confidence,
                is_ambiguous,
            },
            best,
        )
    }
}

fn prepare_text(input: &ClassifyInput) -> PreparedText {
    let name = match &input.name_ar {
        Some(name_ar) => format!("{} {name_ar}", input.name),
        None => input.name.clone(),
    };
    PreparedText {
        name: name.to_lowercase(),
        description: input
            .description
            .as_deref()
            .unwrap_or_default()
            .to_lowercase(),
        breadcrumbs: input.breadcrumbs.join(" ").to_lowercase(),
        url: input.url.as_deref().unwrap_or_default().to_lowercase(),
        image_urls: input
            .image_urls
            .iter()
            .map(|url| url.to_lowercase())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::rules::default_matcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn keyword_classifier() -> Classifier {
        Classifier::new(default_matcher(), None)
    }

    #[test]
    fn empty_input_is_uncategorized_with_zero_confidence() {
        let classifier = keyword_classifier();
        let result = classifier.classify(&ClassifyInput::default());
        assert_eq!(result.category_id, UNCATEGORIZED);
        assert!((result.confidence - 0.0).abs() < f64::EPSILON);
        assert!(!result.is_ambiguous);
    }

    #[test]
    fn strong_name_signal_resolves_category() {
        let classifier = keyword_classifier();
        let result = classifier.classify(&ClassifyInput {
            name: "Compact stroller with carrycot and rain cover".to_string(),
            ..ClassifyInput::default()
        });
        assert_eq!(result.category_id, "strollers-gear");
        assert!(result.confidence > 0.0);
        assert!(result.confidence <= 1.0);
    }

    #[test]
    fn arabic_name_contributes_to_the_signal() {
        let classifier = keyword_classifier();
        let result = classifier.classify(&ClassifyInput {
            name: "2-in-1 travel system".to_string(),
            name_ar: Some("عربة أطفال".to_string()),
            ..ClassifyInput::default()
        });
        assert_eq!(result.category_id, "strollers-gear");
    }

    #[test]
    fn weak_signal_stays_uncategorized() {
        let classifier = keyword_classifier();
        // A single weak-keyword hit scores 1, below the minimum.
        let result = classifier.classify(&ClassifyInput {
            description: Some("so much fun".to_string()),
            ..ClassifyInput::default()
        });
        assert_eq!(result.category_id, UNCATEGORIZED);
        assert!((result.confidence - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_saturates_at_one() {
        let classifier = keyword_classifier();
        let result = classifier.classify(&ClassifyInput {
            name: "stroller pram pushchair buggy bassinet carrycot footmuff".to_string(),
            breadcrumbs: vec!["strollers".to_string(), "stroller".to_string()],
            ..ClassifyInput::default()
        });
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn vision_fallback_reclassifies_with_tags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "[\"stroller\", \"pram\"]" } }]
            })))
            .mount(&server)
            .await;

        let vision = VisionClient::new(vision::VisionConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
            connect_timeout: std::time::Duration::from_secs(3),
            total_timeout: std::time::Duration::from_secs(8),
        })
        .expect("vision client builds");
        let classifier = Classifier::new(default_matcher(), Some(vision));

        let result = classifier
            .classify_with_vision(&ClassifyInput {
                name: "Model X-200".to_string(),
                image_urls: vec!["https://img.example.com/x200.jpg".to_string()],
                ..ClassifyInput::default()
            })
            .await;

        assert_eq!(result.category_id, "strollers-gear");
        assert!(result.confidence > 0.0);
    }

    #[tokio::test]
    async fn vision_failure_keeps_keyword_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let vision = VisionClient::new(vision::VisionConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
            connect_timeout: std::time::Duration::from_secs(3),
            total_timeout: std::time::Duration::from_secs(8),
        })
        .expect("vision client builds");
        let classifier = Classifier::new(default_matcher(), Some(vision));

        let result = classifier
            .classify_with_vision(&ClassifyInput {
                name: "Model X-200".to_string(),
                image_urls: vec!["https://img.example.com/x200.jpg".to_string()],
                ..ClassifyInput::default()
            })
            .await;

        assert_eq!(result.category_id, UNCATEGORIZED);
    }

    #[tokio::test]
    async fn confident_rule_pass_skips_vision() {
        // No mock server mounted: a vision call would fail loudly, but the
        // confident rule result must return before any network activity.
        let vision = VisionClient::new(vision::VisionConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
            connect_timeout: std::time::Duration::from_millis(100),
            total_timeout: std::time::Duration::from_millis(200),
        })
        .expect("vision client builds");
        let classifier = Classifier::new(default_matcher(), Some(vision));

        let result = classifier
            .classify_with_vision(&ClassifyInput {
                name: "Baby stroller with carrycot".to_string(),
                ..ClassifyInput::default()
            })
            .await;

        assert_eq!(result.category_id, "strollers-gear");
    }
}
