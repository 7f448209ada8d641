use std::sync::LazyLock;

use centime_core::{Categorization, Category, TransactionKind};
use regex::Regex;

/// One keyword rule. Higher priority rules are evaluated first; within a
/// priority, declaration order decides.
#[derive(Debug)]
pub struct MerchantPattern {
    pub keywords: &'static [&'static str],
    pub category: Category,
    pub kind: TransactionKind,
    pub priority: u8,
}

const fn pattern(
    keywords: &'static [&'static str],
    category: Category,
    kind: TransactionKind,
    priority: u8,
) -> MerchantPattern {
    MerchantPattern { keywords, category, kind, priority }
}

use Category::*;
use TransactionKind::*;

/// Keyword rules for well-known merchants. Specific sub-brands carry a
/// higher priority than their parent brand so e.g. a fuel purchase at a
/// grocery chain lands in Gas, not Groceries.
pub const MERCHANT_PATTERNS: &[MerchantPattern] = &[
    // fuel brands outrank everything grocery-shaped
    pattern(
        &[
            "FUEL", "SHELL", "CHEVRON", "EXXON", " MOBIL ", "BP ", "TEXACO", "ARCO", "VALERO",
            "SUNOCO", "76 ", "CIRCLE K", "MARATHON GAS", "SPEEDWAY",
        ],
        Gas,
        Purchase,
        100,
    ),
    pattern(
        &[
            "KROGER FUEL", "KROGER FU", "WALMART FUEL", "SAM'S CLUB FUEL", "COSTCO GAS",
            "SAMS CLUB GAS",
        ],
        Gas,
        Purchase,
        95,
    ),
    pattern(
        &[
            "KROGER", "PUBLIX", "SAFEWAY", "ALBERTSONS", "WHOLE FOODS", "TRADER JOE", "ALDI",
            "LIDL", "SPROUTS", "WEGMANS", "H E B", "FRESH MARKET", "FOOD LION", "GIANT FOOD",
            "STOP SHOP", "HARRIS TEETER",
        ],
        Groceries,
        Purchase,
        90,
    ),
    // membership programs are subscriptions, not groceries
    pattern(&["WALMART+", "WALMART PLUS", "WALMARTPLUS"], Subscriptions, Purchase, 93),
    pattern(&["WALMART", "TARGET", "MEIJER", "WINCO"], Groceries, Purchase, 85),
    pattern(
        &[
            "MCDONALD", "BURGER KING", "WENDY'S", "TACO BELL", "KFC", "CHICK FIL A", "POPEYES",
            "SUBWAY", "ARBY'S", "SONIC", "JACK IN THE BOX", "CHIPOTLE", "PANDA EXPRESS",
            "FIVE GUYS", "IN N OUT", "SHAKE SHACK",
        ],
        Dining,
        Purchase,
        90,
    ),
    pattern(
        &["STARBUCKS", "DUNKIN", "PANERA", "CARIBOU COFFEE", "PEET'S COFFEE", "DUTCH BROS"],
        Dining,
        Purchase,
        90,
    ),
    // food delivery outranks the rideshare parent brand
    pattern(&["UBER *EATS", "UBER EATS", "UBEREATS"], Dining, Purchase, 95),
    pattern(
        &["DOORDASH *DASHPASS", "DOORDASH DASHPASS", "DASHPASS"],
        Subscriptions,
        Purchase,
        95,
    ),
    pattern(
        &["DOORDASH", "GRUBHUB", "POSTMATES", "SEAMLESS", "INSTACART", "GOPUFF"],
        Dining,
        Purchase,
        92,
    ),
    pattern(
        &[
            "RESTAURANT", "CAFE", "COFFEE", "PIZZA", "DINER", "GRILL", "BAR & GRILL", "BISTRO",
            "EATERY",
        ],
        Dining,
        Purchase,
        80,
    ),
    pattern(
        &["AMC THEATRES", "REGAL CINEMA", "CINEMARK", "IMAX", "MOVIE", "THEATER", "CINEMA"],
        Entertainment,
        Purchase,
        90,
    ),
    pattern(
        &["TICKETMASTER", "STUBHUB", "EVENTBRITE", "CONCERT", "STADIUM", "ARENA"],
        Entertainment,
        Purchase,
        90,
    ),
    pattern(
        &["AMAZON PRIME VIDEO", "AMZN PRIME VIDEO", "PRIME VIDEO"],
        Subscriptions,
        Purchase,
        97,
    ),
    pattern(
        &[
            "NETFLIX", "HULU", "DISNEY PLUS", "HBO MAX", "APPLE TV", "PARAMOUNT PLUS", "PEACOCK",
            "DISCOVERY PLUS",
        ],
        Subscriptions,
        Purchase,
        95,
    ),
    pattern(
        &["SPOTIFY", "APPLE MUSIC", "YOUTUBE PREMIUM", "YOUTUBE MUSIC", "PANDORA", "TIDAL"],
        Subscriptions,
        Purchase,
        95,
    ),
    pattern(
        &["GYM", "FITNESS", "PLANET FITNESS", "LA FITNESS", "EQUINOX", "YMCA", "CRUNCH"],
        Subscriptions,
        Purchase,
        90,
    ),
    pattern(
        &["AMAZON FRESH", "AMZN FRESH", "AMAZON GROCERY", "WHOLE FOODS AMAZON"],
        Groceries,
        Purchase,
        94,
    ),
    pattern(&["AMAZON", "AMZN"], Shopping, Purchase, 92),
    pattern(&["BEST BUY", "APPLE STORE", "MICROSOFT STORE", "GAMESTOP"], Shopping, Purchase, 90),
    pattern(
        &[
            "MACY", "NORDSTROM", "KOHL'S", "JC PENNEY", "DILLARD", "SAKS", "NEIMAN MARCUS",
            "BLOOMINGDALE",
        ],
        Shopping,
        Purchase,
        90,
    ),
    pattern(&["TJ MAXX", "MARSHALLS", "ROSS", "BURLINGTON", "HOMEGOODS"], Shopping, Purchase, 90),
    pattern(
        &["CVS PHARMACY", "WALGREENS", "RITE AID", "DUANE READE", "PHARMACY"],
        Healthcare,
        Purchase,
        90,
    ),
    pattern(
        &[
            "DOCTOR", "DENTIST", "DENTAL", "MEDICAL", "CLINIC", "HOSPITAL", "URGENT CARE",
            "HEALTH",
        ],
        Healthcare,
        Purchase,
        85,
    ),
    pattern(
        &["UBER *TRIP", "UBER TRIP", "UBER *RIDE", "UBER RIDE"],
        Transportation,
        Purchase,
        93,
    ),
    pattern(&["UBER", "LYFT", "TAXI", "CAB"], Transportation, Purchase, 88),
    pattern(
        &["TOLL", "PARKING", "PARK", "METRO", "SUBWAY", "TRANSIT", "BUS FARE", "TRAIN"],
        Transportation,
        Purchase,
        88,
    ),
    pattern(
        &[
            "AIRLINES", "DELTA", "UNITED", "AMERICAN AIR", "SOUTHWEST", "JETBLUE", "SPIRIT",
            "FRONTIER", "ALASKA AIR",
        ],
        Travel,
        Purchase,
        95,
    ),
    pattern(
        &[
            "MARRIOTT", "HILTON", "HYATT", "IHG", "HOLIDAY INN", "BEST WESTERN", "RADISSON",
            "SHERATON", "WESTIN", "HOTEL", "MOTEL", "INN", "RESORT", "AIRBNB", "VRBO",
        ],
        Travel,
        Purchase,
        92,
    ),
    pattern(
        &[
            "HERTZ", "ENTERPRISE", "BUDGET", "AVIS", "NATIONAL CAR", "ALAMO", "THRIFTY",
            "DOLLAR RENT",
        ],
        Travel,
        Purchase,
        92,
    ),
    pattern(
        &["HOME DEPOT", "LOWE'S", "ACE HARDWARE", "TRUE VALUE", "MENARDS", "HARBOR FREIGHT"],
        HomeGarden,
        Purchase,
        90,
    ),
    pattern(&["GARDEN", "NURSERY", "LANDSCAPE", "LAWN"], HomeGarden, Purchase, 85),
    pattern(
        &[
            "VERIZON", "AT&T", "T MOBILE", "SPRINT", "COMCAST", "XFINITY", "SPECTRUM",
            "COX COMMUNICATIONS", "INTERNET", "ELECTRIC", "WATER", "GAS COMPANY", "UTILITY",
        ],
        BillsUtilities,
        Purchase,
        90,
    ),
    pattern(
        &["INSURANCE", "GEICO", "STATE FARM", "ALLSTATE", "PROGRESSIVE"],
        BillsUtilities,
        Purchase,
        88,
    ),
    pattern(
        &["SALON", "BARBER", "HAIR", "NAIL", "SPA", "MASSAGE", "ULTA", "SEPHORA", "BEAUTY"],
        PersonalCare,
        Purchase,
        88,
    ),
    // money movement sits near the top so nothing shadows it
    pattern(&["APPLE CASH", "APPLE PAY CASH"], Other, Transfer, 99),
    pattern(
        &[
            "ZELLE", "VENMO", "PAYPAL", "CASH APP", "TRANSFER", "ATM WITHDRAWAL",
            "WIRE TRANSFER", "ACH TRANSFER", "AUTOPAY",
        ],
        Other,
        Transfer,
        98,
    ),
    pattern(
        &["PAYROLL", "DIRECT DEPOSIT", "REFUND", "REIMBURSEMENT", "SALARY", "WAGES"],
        Other,
        Income,
        99,
    ),
];

// Evaluation order: descending priority, stable within ties.
static ORDERED: LazyLock<Vec<&'static MerchantPattern>> = LazyLock::new(|| {
    let mut ordered: Vec<_> = MERCHANT_PATTERNS.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
    ordered
});

static STORE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\d+").unwrap());
static SITE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(STORE|LOCATION|BRANCH)\s*\d+").unwrap());
static VENUE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(SUPERCENTER|MARKETPLACE|STORE|MARKET)").unwrap());
static EMBEDDED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}(/\d{4})?").unwrap());
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Reduce a merchant to its base brand for keyword matching: store and
/// branch numbers, venue suffixes and embedded dates all go.
///
/// "WALMART SUPERCENTER #123" becomes "WALMART".
pub fn normalize_to_base_merchant(merchant: &str) -> String {
    let upper = merchant.to_uppercase();
    let s = STORE_NUMBER.replace_all(upper.trim(), "");
    let s = SITE_NUMBER.replace_all(&s, "");
    let s = VENUE_SUFFIX.replace_all(&s, "");
    let s = EMBEDDED_DATE.replace_all(&s, "");
    MULTI_SPACE.replace_all(&s, " ").trim().to_string()
}

/// Match a merchant against the keyword table. Keywords are checked
/// against both the raw uppercased name and its base-brand form; the
/// first hit in priority order wins. `None` means the table has no
/// opinion and the caller should fall back to cache or the remote model.
pub fn categorize_by_pattern(merchant: &str) -> Option<Categorization> {
    let upper = merchant.to_uppercase();
    let base = normalize_to_base_merchant(merchant);

    for pattern in ORDERED.iter() {
        for keyword in pattern.keywords {
            if upper.contains(keyword) || base.contains(keyword) {
                return Some(Categorization {
                    category: pattern.category,
                    kind: pattern.kind,
                    confidence: 1.0,
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorize(merchant: &str) -> (Category, TransactionKind) {
        let c = categorize_by_pattern(merchant).unwrap();
        (c.category, c.kind)
    }

    // ── normalize_to_base_merchant ────────────────────────────────────────────

    #[test]
    fn strips_store_numbers_and_suffixes() {
        assert_eq!(normalize_to_base_merchant("KROGER #1234"), "KROGER");
        assert_eq!(normalize_to_base_merchant("STARBUCKS STORE 5678"), "STARBUCKS");
        assert_eq!(normalize_to_base_merchant("WALMART SUPERCENTER #123"), "WALMART");
    }

    #[test]
    fn strips_embedded_dates() {
        assert_eq!(normalize_to_base_merchant("KROGER 01/15/2024"), "KROGER");
    }

    // ── priority ordering ─────────────────────────────────────────────────────

    #[test]
    fn fuel_outranks_grocery_brand() {
        assert_eq!(categorize("KROGER FUEL #747"), (Category::Gas, TransactionKind::Purchase));
        assert_eq!(categorize("KROGER #1234"), (Category::Groceries, TransactionKind::Purchase));
    }

    #[test]
    fn membership_outranks_parent_brand() {
        assert_eq!(categorize("WALMART+ MEMBERSHIP"), (Category::Subscriptions, TransactionKind::Purchase));
        assert_eq!(categorize("WALMART GROCERY"), (Category::Groceries, TransactionKind::Purchase));
    }

    #[test]
    fn uber_sub_brands() {
        assert_eq!(categorize("UBER *EATS SF"), (Category::Dining, TransactionKind::Purchase));
        assert_eq!(categorize("UBER *TRIP HELP.UBER.COM"), (Category::Transportation, TransactionKind::Purchase));
        assert_eq!(categorize("UBER BV"), (Category::Transportation, TransactionKind::Purchase));
    }

    #[test]
    fn doordash_sub_brands() {
        assert_eq!(categorize("DOORDASH DASHPASS"), (Category::Subscriptions, TransactionKind::Purchase));
        assert_eq!(categorize("DOORDASH *BURGERS"), (Category::Dining, TransactionKind::Purchase));
    }

    #[test]
    fn amazon_sub_brands() {
        assert_eq!(categorize("AMAZON FRESH"), (Category::Groceries, TransactionKind::Purchase));
        assert_eq!(categorize("AMZN PRIME VIDEO"), (Category::Subscriptions, TransactionKind::Purchase));
        assert_eq!(categorize("AMAZON MKTP US"), (Category::Shopping, TransactionKind::Purchase));
    }

    #[test]
    fn transfers_and_income() {
        assert_eq!(categorize("ZELLE SENT TO BOB"), (Category::Other, TransactionKind::Transfer));
        assert_eq!(categorize("APPLE CASH 1INFINITELOOP"), (Category::Other, TransactionKind::Transfer));
        assert_eq!(categorize("ACME PAYROLL"), (Category::Other, TransactionKind::Income));
    }

    #[test]
    fn site_number_variants_match() {
        assert_eq!(categorize("KROGER STORE 881"), (Category::Groceries, TransactionKind::Purchase));
    }

    #[test]
    fn unknown_merchant_is_none() {
        assert!(categorize_by_pattern("XAVIER QUANTUM WIDGETS").is_none());
    }

    #[test]
    fn case_insensitive_input() {
        assert_eq!(categorize("starbucks #221"), (Category::Dining, TransactionKind::Purchase));
    }
}
