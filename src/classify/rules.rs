//! Category keyword rules and the matcher built over them.
//!
//! Each leaf category carries a bilingual (English/Arabic) keyword
//! vocabulary. Matching uses Aho-Corasick over all keywords at once; a
//! keyword contributes to a field's score at most once, no matter how often
//! it repeats inside that field.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use anyhow::{Context, Result};

/// Keyword rule for a single leaf category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub id: &'static str,
    pub keywords: &'static [&'static str],
    /// Low-value hints, matched against the description only.
    pub weak_keywords: &'static [&'static str],
    /// A hit in the product name disqualifies the category.
    pub negative: &'static [&'static str],
    pub weight: i64,
}

/// Field multipliers. Breadcrumbs are the highest-trust signal.
pub(crate) const NAME_MULTIPLIER: i64 = 3;
pub(crate) const BREADCRUMB_MULTIPLIER: i64 = 5;
pub(crate) const URL_MULTIPLIER: i64 = 2;
pub(crate) const IMAGE_MULTIPLIER: i64 = 2;
pub(crate) const DESCRIPTION_MULTIPLIER: i64 = 1;
pub(crate) const WEAK_KEYWORD_BONUS: i64 = 1;
pub(crate) const NEGATIVE_PENALTY: i64 = -50;

/// Lowercased text fields of one product, ready for matching.
#[derive(Debug, Default, Clone)]
pub struct PreparedText {
    pub name: String,
    pub description: String,
    pub breadcrumbs: String,
    pub url: String,
    pub image_urls: Vec<String>,
}

/// Aho-Corasick automatons over the rule vocabularies, plus pattern-to-rule
/// index maps.
#[derive(Debug)]
pub struct RuleMatcher {
    rules: &'static [CategoryRule],
    keywords: AhoCorasick,
    keyword_rule: Vec<usize>,
    weak: AhoCorasick,
    weak_rule: Vec<usize>,
    negative: AhoCorasick,
    negative_rule: Vec<usize>,
}

impl RuleMatcher {
    /// Build the matcher for a rule set.
    ///
    /// # Errors
    /// Returns an error when an automaton cannot be constructed.
    pub fn new(rules: &'static [CategoryRule]) -> Result<Self> {
        let (keyword_patterns, keyword_rule) =
            flatten(rules, |rule| rule.keywords);
        let (weak_patterns, weak_rule) = flatten(rules, |rule| rule.weak_keywords);
        let (negative_patterns, negative_rule) = flatten(rules, |rule| rule.negative);

        Ok(Self {
            rules,
            keywords: build_automaton(&keyword_patterns)
                .context("failed to build keyword automaton")?,
            keyword_rule,
            weak: build_automaton(&weak_patterns)
                .context("failed to build weak-keyword automaton")?,
            weak_rule,
            negative: build_automaton(&negative_patterns)
                .context("failed to build negative-keyword automaton")?,
            negative_rule,
        })
    }

    #[must_use]
    pub fn rules(&self) -> &'static [CategoryRule] {
        self.rules
    }

    /// Accumulate per-category scores for one product.
    ///
    /// Returned scores are indexed like `rules()` and may be negative.
    #[must_use]
    pub fn score(&self, text: &PreparedText) -> Vec<i64> {
        let mut scores = vec![0i64; self.rules.len()];

        for rule_idx in distinct_hits(&self.negative, &self.negative_rule, &text.name) {
            scores[rule_idx] += NEGATIVE_PENALTY;
        }

        self.score_field(&text.name, NAME_MULTIPLIER, &mut scores);
        self.score_field(&text.breadcrumbs, BREADCRUMB_MULTIPLIER, &mut scores);
        self.score_field(&text.url, URL_MULTIPLIER, &mut scores);
        self.score_field(&text.description, DESCRIPTION_MULTIPLIER, &mut scores);
        for image_url in &text.image_urls {
            self.score_field(image_url, IMAGE_MULTIPLIER, &mut scores);
        }

        for rule_idx in distinct_hits(&self.weak, &self.weak_rule, &text.description) {
            scores[rule_idx] += WEAK_KEYWORD_BONUS;
        }

        scores
    }

    fn score_field(&self, field: &str, multiplier: i64, scores: &mut [i64]) {
        if field.is_empty() {
            return;
        }
        let mut seen = HashSet::new();
        for mat in self.keywords.find_overlapping_iter(field) {
            if seen.insert(mat.pattern()) {
                let rule_idx = self.keyword_rule[mat.pattern().as_usize()];
                scores[rule_idx] += self.rules[rule_idx].weight * multiplier;
            }
        }
    }
}

fn build_automaton(patterns: &[&'static str]) -> Result<AhoCorasick, aho_corasick::BuildError> {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::Standard)
        .ascii_case_insensitive(true)
        .build(patterns)
}

fn flatten(
    rules: &'static [CategoryRule],
    select: impl Fn(&CategoryRule) -> &'static [&'static str],
) -> (Vec<&'static str>, Vec<usize>) {
    let mut patterns = Vec::new();
    let mut owners = Vec::new();
    for (idx, rule) in rules.iter().enumerate() {
        for keyword in select(rule) {
            patterns.push(*keyword);
            owners.push(idx);
        }
    }
    (patterns, owners)
}

fn distinct_hits(automaton: &AhoCorasick, owners: &[usize], field: &str) -> Vec<usize> {
    if field.is_empty() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    for mat in automaton.find_overlapping_iter(field) {
        if seen.insert(mat.pattern()) {
            hits.push(owners[mat.pattern().as_usize()]);
        }
    }
    hits
}

/// The default matcher over [`DEFAULT_RULES`].
#[must_use]
pub fn default_matcher() -> RuleMatcher {
    RuleMatcher::new(DEFAULT_RULES).expect("default rule matcher")
}

/// Catalog leaf-category vocabularies.
pub static DEFAULT_RULES: &[CategoryRule] = &[
    CategoryRule {
        id: "baby-care",
        keywords: &[
            "diaper", "wipes", "cream", "lotion", "oil", "shampoo", "soap", "bath", "grooming",
            "thermometer", "aspirator", "health", "monitor", "safety", "gate", "lock", "potty",
            "training", "step", "stool", "toothbrush", "paste", "nail", "clipper", "towel",
            "washcloth", "sponge", "rinser", "tub", "stand", "mat", "visor", "حفاضات", "مناديل",
            "كريم", "لوشن", "زيت", "شامبو", "صابون", "استحمام", "عناية", "ميزان حرارة", "شفاط",
            "صحة", "مراقبة", "أمان", "بوابة", "قفل", "بوثي", "تدريب", "كرسي", "فرشاة", "عجينة",
            "مقص", "أظافر", "منشفة", "ليفة", "إسفنجة", "حوض", "مسند", "سجادة", "قبعة",
        ],
        weak_keywords: &[],
        negative: &["toy", "doll", "clothes", "dress", "block"],
        weight: 10,
    },
    CategoryRule {
        id: "strollers-gear",
        keywords: &[
            "stroller", "pram", "pushchair", "buggy", "travel system", "bassinet", "carrycot",
            "car seat", "booster", "base", "adapter", "carrier", "wrap", "sling", "backpack",
            "diaper bag", "changing bag", "organizer", "holder", "hook", "footmuff", "rain cover",
            "sunshade", "net", "mosquito", "parasol", "umbrella", "wheel", "board", "عربة",
            "عربية", "مستلزمات", "شنطة", "مقعد سيارة", "كارسيت", "بوستر", "قاعدة", "شيالة",
            "حمالة", "حقيبة", "منظم", "حامل", "خطاف", "غطاء مطر", "ناموسية", "شمسية",
        ],
        weak_keywords: &["travel", "outdoor", "walk", "ride"],
        negative: &[],
        weight: 10,
    },
    CategoryRule {
        id: "feeding",
        keywords: &[
            "bottle", "nipple", "teat", "pacifier", "soother", "dummy", "clip", "holder",
            "breast pump", "nursing", "pad", "shield", "milk", "storage", "bag", "container",
            "formula", "food", "cereal", "snack", "pouch", "puree", "biscuit", "cookie",
            "high chair", "booster seat", "bib", "burp cloth", "placemat", "plate", "bowl",
            "spoon", "fork", "cup", "sippy", "straw", "trainer", "sterilizer", "warmer",
            "blender", "steamer", "processor", "maker", "drying rack", "brush", "cleaning",
            "biberon", "feeding", "رضاعة", "ببرونة", "حلمة", "لهاية", "تيتينا", "مشبك",
            "شفاط ثدي", "صدر", "رضاغة", "حليب", "تخزين", "كيس", "علبة", "طعام", "سيريلاك",
            "وجبة", "بسكويت", "كراسي طعام", "كرسي طعام", "مريلة", "مريول", "طبق", "صحن",
            "زبدية", "ملعقة", "شوكة", "كوب", "كأس", "شفاطة", "معقم", "سخان", "خلاط",
            "محضر طعام", "مجفف", "فرشاة تنظيف",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 10,
    },
    CategoryRule {
        id: "toys",
        keywords: &[
            "toy", "game", "puzzle", "doll", "action figure", "playset", "building", "block",
            "lego", "soft toy", "plush", "stuffed", "teddy", "bear", "animal", "musical",
            "instrument", "car", "truck", "train", "vehicle", "ball", "activity", "center",
            "gym", "playmat", "walker", "rocker", "bouncer", "swing", "jumper", "sorter",
            "stacker", "rattle", "teether", "bath toy", "water", "sand", "outdoor", "ride-on",
            "bike", "trike", "scooter", "skate", "helmet", "pad", "battery", "remote", "لعبة",
            "ألعاب", "بازل", "دمية", "عروسة", "شخصية", "مكعبات", "ليجو", "دبدوب", "حيوان",
            "موسيقى", "سيارة", "شاحنة", "قطار", "كرة", "نشاط", "مركز", "جيم", "سجادة لعب",
            "مشاية", "هزاز", "مرجيحة", "نطاطة", "خشخشة", "عضاضة", "ألعاب استحمام", "ماء",
            "رمل", "خارجي", "ركوب", "دراجة", "سكوتر", "خوذة", "بطارية", "ريموت",
        ],
        weak_keywords: &["fun", "play", "learn", "educational"],
        negative: &[],
        weight: 10,
    },
    CategoryRule {
        id: "clothing",
        keywords: &[
            "clothing", "clothes", "wear", "apparel", "outfit", "set", "suit", "dress", "skirt",
            "shirt", "t-shirt", "top", "blouse", "pants", "trousers", "jeans", "leggings",
            "shorts", "jacket", "coat", "vest", "sweater", "cardigan", "hoodie", "jumper",
            "sweatshirt", "onesie", "romper", "bodysuit", "jumpsuit", "pajama", "sleepwear",
            "robe", "gown", "nightgown", "underwear", "briefs", "panties", "boxers", "socks",
            "tights", "shoes", "boots", "booties", "sandals", "slippers", "sneakers",
            "trainers", "hat", "cap", "beanie", "gloves", "mittens", "scarf", "swimwear",
            "swimsuit", "bikini", "trunks", "costume", "uniform", "ملابس", "لبس", "زي", "طقم",
            "بدلة", "فستان", "تنورة", "جيب", "قميص", "تيشرت", "بلوزة", "بنطلون", "جينز",
            "ليقنز", "شورت", "جاكيت", "معطف", "بالطو", "فيست", "بلوفر", "سويت شيرت", "هودي",
            "سالوبيت", "بربتوز", "بيجامة", "ملابس نوم", "روب", "ملابس داخلية", "كلسون",
            "بوكسر", "شراب", "جوارب", "كولون", "حذاء", "جزمة", "صندل", "شبشب", "كوتشي",
            "قبعة", "طاقية", "قفاز", "جوانتي", "كوفية", "مايوه", "ملابس سباحة", "تنكري",
            "يونيفورم",
        ],
        weak_keywords: &[],
        negative: &["doll", "toy"],
        weight: 10,
    },
    CategoryRule {
        id: "maternity",
        keywords: &[
            "maternity", "pregnancy", "pregnant", "nursing", "breastfeeding", "mom", "mum",
            "mother", "postpartum", "hospital bag", "belly", "support", "belt", "band",
            "pillow", "bra", "underwear", "shapewear", "dress", "tops", "pants", "jeans",
            "leggings", "cream", "oil", "lotion", "stretch mark", "nipple", "care", "pad",
            "shield", "supplement", "vitamin", "tea", "أمام", "أمومة", "حمل", "حامل", "رضاعة",
            "طبيعية", "أم", "ماما", "نفاس", "شنطة الولادة", "بطن", "دعم", "حزام", "مشد",
            "وسادة", "مخدة", "حمالة صدر", "توب", "بنطلون", "جينز", "ليقنز", "كريم", "زيت",
            "لوشن", "علامات تمدد", "تشققات", "حلمة", "عناية", "قطن", "مكمل", "فيتامين", "شاي",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 10,
    },
    CategoryRule {
        id: "nursery",
        keywords: &[
            "nursery", "room", "furniture", "decor", "bed", "crib", "cot", "cradle", "bassinet",
            "mattress", "sheet", "bedding", "blanket", "comforter", "quilt", "pillow", "bumper",
            "mobile", "canopy", "net", "curtain", "rug", "carpet", "mat", "lamp", "light",
            "nightlight", "storage", "organizer", "box", "basket", "bin", "chest", "wardrobe",
            "closet", "hanger", "shelf", "table", "chair", "sofa", "beanbag", "rocker",
            "glider", "ottoman", "wallpaper", "sticker", "decal", "غرفة", "نوم", "أثاث",
            "ديكور", "سرير", "مهد", "مرتبة", "ملاءة", "مفرش", "بطانية", "لحاف", "وسادة",
            "مخدة", "ناموسية", "ستارة", "سجادة", "مصباح", "إضاءة", "وناسة", "تخزين", "منظم",
            "صندوق", "سلة", "دولاب", "خزانة", "شماعة", "رف", "طاولة", "كرسي", "كنبة",
            "بين باج", "هزاز", "ورق حائط", "ملصق",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 8,
    },
    CategoryRule {
        id: "bathing",
        keywords: &[
            "bath", "bathing", "tub", "stand", "seat", "support", "mat", "non-slip",
            "thermometer", "rinser", "jug", "cup", "toy", "storage", "organizer", "towel",
            "hooded", "washcloth", "sponge", "mitt", "robe", "gown", "shampoo", "wash", "soap",
            "bubble", "oil", "lotion", "cream", "powder", "cologne", "perfume", "brush",
            "comb", "manicure", "clippers", "scissors", "aspirator", "استحمام", "حمام", "حوض",
            "بانيو", "مسند", "كرسي", "سجادة", "مانع انزلاق", "ميزان حرارة", "كوب", "لعبة",
            "تخزين", "منظم", "منشفة", "بشكير", "برنس", "ليفة", "إسفنجة", "روب", "شامبو",
            "غسول", "صابون", "رغوة", "زيت", "لوشن", "كريم", "بودرة", "كولونيا", "عطر",
            "فرشاة", "مشط", "مقص", "أظافر", "شفاط",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 9,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_index(id: &str) -> usize {
        DEFAULT_RULES
            .iter()
            .position(|rule| rule.id == id)
            .expect("known rule id")
    }

    #[test]
    fn stroller_name_scores_strollers_gear() {
        let matcher = default_matcher();
        let text = PreparedText {
            name: "lightweight stroller with carrycot".to_string(),
            ..PreparedText::default()
        };
        let scores = matcher.score(&text);
        let idx = rule_index("strollers-gear");
        // Two distinct keywords, name multiplier 3, weight 10.
        assert_eq!(scores[idx], 60);
    }

    #[test]
    fn repeated_keyword_counts_once_per_field() {
        let matcher = default_matcher();
        let text = PreparedText {
            name: "stroller stroller stroller".to_string(),
            ..PreparedText::default()
        };
        let scores = matcher.score(&text);
        assert_eq!(scores[rule_index("strollers-gear")], 30);
    }

    #[test]
    fn breadcrumbs_outweigh_name() {
        let matcher = default_matcher();
        let by_name = matcher.score(&PreparedText {
            name: "stroller".to_string(),
            ..PreparedText::default()
        });
        let by_breadcrumb = matcher.score(&PreparedText {
            breadcrumbs: "stroller".to_string(),
            ..PreparedText::default()
        });
        let idx = rule_index("strollers-gear");
        assert!(by_breadcrumb[idx] > by_name[idx]);
        assert_eq!(by_breadcrumb[idx], 50);
    }

    #[test]
    fn negative_keyword_penalizes_category() {
        let matcher = default_matcher();
        let text = PreparedText {
            // "doll" penalizes clothing; "dress" would otherwise pull it up.
            name: "princess doll with dress".to_string(),
            ..PreparedText::default()
        };
        let scores = matcher.score(&text);
        assert!(scores[rule_index("clothing")] < 0);
        assert!(scores[rule_index("toys")] > 0);
    }

    #[test]
    fn arabic_keywords_match() {
        let matcher = default_matcher();
        let text = PreparedText {
            name: "عربة أطفال خفيفة".to_string(),
            ..PreparedText::default()
        };
        let scores = matcher.score(&text);
        assert!(scores[rule_index("strollers-gear")] > 0);
    }

    #[test]
    fn weak_keywords_only_add_one_point() {
        let matcher = default_matcher();
        let text = PreparedText {
            description: "educational".to_string(),
            ..PreparedText::default()
        };
        let scores = matcher.score(&text);
        assert_eq!(scores[rule_index("toys")], 1);
    }

    #[test]
    fn image_filenames_contribute() {
        let matcher = default_matcher();
        let text = PreparedText {
            image_urls: vec!["https://cdn.example.com/img/stroller-front.jpg".to_string()],
            ..PreparedText::default()
        };
        let scores = matcher.score(&text);
        assert_eq!(scores[rule_index("strollers-gear")], 20);
    }

    #[test]
    fn empty_text_scores_zero_everywhere() {
        let matcher = default_matcher();
        let scores = matcher.score(&PreparedText::default());
        assert!(scores.iter().all(|score| *score == 0));
    }
}
