use once_cell::sync::Lazy;
use regex::Regex;

/// One named pattern for a numeric field. Rules for a field are evaluated
/// in declaration order and the first in-range match wins, so disambiguating
/// patterns (price-in-millions) must precede the generic ones.
pub struct NumberRule {
    pub name: &'static str,
    pub regex: Lazy<Regex>,
    /// Multiplier applied to the captured number (millions, thousands).
    pub multiplier: f64,
    /// Capture group that disqualifies a match when present. Used to keep a
    /// "180 000 руб за кв.м" mention from being read as a total price: the
    /// regex engine has no lookahead, so the suffix is captured and checked.
    pub reject_group: Option<usize>,
}

impl NumberRule {
    /// All candidate values this rule finds in the text, in order.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = f64> + 'a {
        let reject_group = self.reject_group;
        let multiplier = self.multiplier;
        self.regex.captures_iter(text).filter_map(move |caps| {
            if let Some(group) = reject_group {
                if caps.get(group).is_some() {
                    return None;
                }
            }
            let raw = caps.get(1)?.as_str();
            parse_decimal(raw).map(|v| v * multiplier)
        })
    }
}

/// "5 200 000" / "5,2" / "178 571" into f64.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok()
}

const PER_M2_SUFFIX: &str = r"(?:\s*(?:/|за)\s*(?:кв\.?\s*м|м²|м2|метр))";

pub static PRICE_RULES: [NumberRule; 3] = [
    NumberRule {
        name: "price_millions",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)(?:от\s+)?(\d+(?:[.,]\d+)?)\s*млн").unwrap()
        }),
        multiplier: 1_000_000.0,
        reject_group: None,
    },
    NumberRule {
        name: "price_keyword",
        regex: Lazy::new(|| {
            // The gap class excludes "м" so the keyword cannot bridge over a
            // "за метр"/"кв.м" mention to an unrelated figure.
            Regex::new(&format!(
                r"(?i)(?:цена|стоимость|бюджет)[^\dм]{{0,15}}?(\d(?:[\d\s]*\d)?)\s*(?:руб|₽)?({})?",
                PER_M2_SUFFIX
            ))
            .unwrap()
        }),
        multiplier: 1.0,
        reject_group: Some(2),
    },
    NumberRule {
        name: "price_ruble_amount",
        regex: Lazy::new(|| {
            Regex::new(&format!(
                r"(\d{{1,3}}(?:\s\d{{3}}){{1,}})\s*(?:руб|₽)({})?",
                PER_M2_SUFFIX
            ))
            .unwrap()
        }),
        multiplier: 1.0,
        reject_group: Some(2),
    },
];

pub static PRICE_PER_M2_RULES: [NumberRule; 3] = [
    NumberRule {
        name: "ppm2_ruble_per_meter",
        regex: Lazy::new(|| {
            Regex::new(&format!(r"(?i)(\d[\d\s]{{2,}}\d)\s*(?:руб|₽|р)\.?{}", PER_M2_SUFFIX))
                .unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
    NumberRule {
        name: "ppm2_price_of_meter",
        regex: Lazy::new(|| {
            Regex::new(
                r"(?i)(?:цена|стоимость)\s+(?:за\s+)?(?:кв\.?\s*м|м²|м2|метр[а-яё]*)\D{0,10}?(\d[\d\s]{2,}\d)",
            )
            .unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
    NumberRule {
        name: "ppm2_thousands",
        regex: Lazy::new(|| {
            Regex::new(&format!(
                r"(?i)(\d+(?:[.,]\d+)?)\s*тыс\.?\s*(?:руб|₽)?\.?{}",
                PER_M2_SUFFIX
            ))
            .unwrap()
        }),
        multiplier: 1_000.0,
        reject_group: None,
    },
];

pub static AREA_RULES: [NumberRule; 2] = [
    NumberRule {
        name: "area_keyword",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)(?:площадью?|метраж[а-яё]*)\D{0,10}?(\d+(?:[.,]\d+)?)").unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
    NumberRule {
        name: "area_unit",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:кв\.?\s*м|м²|м2)\b").unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
];

// Return-rate rules are keyword-anchored so a fee or mortgage percentage
// («Комиссия 23%», «ставка 19%») never reads as a yield.
pub static ROI_RULES: [NumberRule; 3] = [
    NumberRule {
        name: "roi_dokhodnost",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)доходность\D{0,20}?(\d+(?:[.,]\d+)?)\s*%").unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
    NumberRule {
        name: "roi_godovykh",
        regex: Lazy::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*%\s*годовых").unwrap()),
        multiplier: 1.0,
        reject_group: None,
    },
    NumberRule {
        name: "roi_english",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)(?:yield|roi)\D{0,10}?(\d+(?:[.,]\d+)?)\s*%").unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
];

pub static OCCUPANCY_RULES: [NumberRule; 1] = [NumberRule {
    name: "occupancy_keyword",
    regex: Lazy::new(|| {
        Regex::new(r"(?i)(?:загрузка|загрузкой|заполняемость|occupancy)\D{0,20}?(\d+(?:[.,]\d+)?)\s*%")
            .unwrap()
    }),
    multiplier: 1.0,
    reject_group: None,
}];

pub static SEASON_LOW_RULES: [NumberRule; 1] = [NumberRule {
    name: "season_low",
    regex: Lazy::new(|| {
        Regex::new(r"(?i)(?:зимой|в\s+низкий\s+сезон|низкий\s+сезон)\D{0,15}?(\d+(?:[.,]\d+)?)\s*%")
            .unwrap()
    }),
    multiplier: 1.0,
    reject_group: None,
}];

pub static SEASON_HIGH_RULES: [NumberRule; 1] = [NumberRule {
    name: "season_high",
    regex: Lazy::new(|| {
        Regex::new(
            r"(?i)(?:летом|в\s+высокий\s+сезон|высокий\s+сезон|в\s+пик\s+сезона)\D{0,15}?(\d+(?:[.,]\d+)?)\s*%",
        )
        .unwrap()
    }),
    multiplier: 1.0,
    reject_group: None,
}];

pub static ADR_RULES: [NumberRule; 2] = [
    NumberRule {
        name: "adr_keyword",
        regex: Lazy::new(|| {
            Regex::new(
                r"(?i)(?:adr|средний\s+тариф|тариф\s+за\s+ночь|цена\s+(?:за\s+)?ночь)\D{0,15}?(\d[\d\s]*\d|\d)",
            )
            .unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
    NumberRule {
        name: "adr_per_night",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)(\d[\d\s]*\d|\d)\s*(?:руб|₽)\s*(?:за\s+|/\s*)ночь").unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
];

pub static PAYBACK_RULES: [NumberRule; 2] = [
    NumberRule {
        name: "payback_keyword",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)окупаемость\D{0,20}?(\d+(?:[.,]\d+)?)\s*(?:лет|год)").unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
    NumberRule {
        name: "payback_okupitsya",
        regex: Lazy::new(|| {
            Regex::new(r"(?i)окупится\s*(?:за)?\D{0,5}?(\d+(?:[.,]\d+)?)\s*(?:лет|год)").unwrap()
        }),
        multiplier: 1.0,
        reject_group: None,
    },
];

// Title patterns, tried before the generic capitalized-phrase fallback.
pub static TITLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"«([^»\n]{3,60})»").unwrap());
pub static TITLE_DOUBLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"\n]{3,60})""#).unwrap());
pub static TITLE_NAMED_COMPLEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:ЖК|Апарт-отель|Апарт-комплекс|Комплекс|Отель|Клубный\s+дом)\s+([А-ЯЁA-Z][\w-]*(?:\s+[А-ЯЁA-Z][\w-]*){0,3})",
    )
    .unwrap()
});
pub static TITLE_CAPITALIZED_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([А-ЯЁA-Z][а-яёa-z-]{2,}(?:\s+[А-ЯЁA-Z][а-яёa-z-]+){0,3})").unwrap()
});

/// City keyword table: first match in scan order wins. District and
/// peninsula names fold into their market city.
pub static CITY_KEYWORDS: &[(&str, &str)] = &[
    ("сочи", "Сочи"),
    ("адлер", "Сочи"),
    ("сириус", "Сочи"),
    ("красная поляна", "Сочи"),
    ("москв", "Москва"),
    ("петербург", "Санкт-Петербург"),
    ("спб", "Санкт-Петербург"),
    ("анап", "Анапа"),
    ("геленджик", "Геленджик"),
    ("калининград", "Калининград"),
    ("зеленоградск", "Калининград"),
    ("ялт", "Ялта"),
    ("алушт", "Алушта"),
];

pub static CONSTRUCTION_KEYWORDS: &[&str] = &[
    "строительств",
    "строящ",
    "стройк",
    "котлован",
    "сдача в",
    "сдаётся в",
    "сдается в",
];

pub static PLANNING_KEYWORDS: &[&str] = &["проектиров", "в проекте", "старт продаж скоро"];

pub static SOLD_KEYWORDS: &[&str] = &["продан", "sold out", "лоты закончились"];

/// «Продано 80% лотов» is marketing for an active project, not a sold one.
pub static PARTIALLY_SOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)продан\w*\s+(?:уже\s+)?\d+\s*%").unwrap());

/// Format keyword table, most specific first: "апарт-отель" must win over
/// the bare "апартамент" stem it contains.
pub static FORMAT_KEYWORDS: &[(&str, &str)] = &[
    ("апарт-отель", "апарт-отель"),
    ("апартотель", "апарт-отель"),
    ("гостиничн", "гостиничный номер"),
    ("студи", "студия"),
    ("апартамент", "апартаменты"),
    ("квартир", "квартира"),
    ("вилл", "вилла"),
    ("таунхаус", "таунхаус"),
];
