/// Marker name keywords, checked in the order the categories are listed in
/// `NAME_KEYWORDS`; the first category with a matching keyword wins.
pub const VAULT_KEYWORDS: &[&str] = &[
    "vault 111",
    "vault 81",
    "vault 114",
    "vault 75",
    "vault 95",
    "vault 88",
    "vault overlook",
];

pub const MILITARY_KEYWORDS: &[&str] = &[
    "fort hagen",
    "fort strong",
    "national guard",
    "military",
    "gunners plaza",
    "south boston checkpoint",
    "castle",
    "u.s.s.",
    "uss ",
    "army",
    "sentinel site",
];

pub const POLICE_KEYWORDS: &[&str] = &["police", "cambridge police"];

pub const CITY_KEYWORDS: &[&str] = &[
    "diamond city",
    "goodneighbor",
    "the institute",
    "faneuil hall",
    "prydwen",
];

pub const SETTLEMENT_KEYWORDS: &[&str] = &[
    "sanctuary",
    "red rocket truck stop",
    "starlight drive",
    "tenpines",
    "abernathy",
    "sunshine tidings",
    "oberland",
    "graygarden",
    "gray garden",
    "hangman's alley",
    "jamaica plain",
    "the castle",
    "spectacle island",
    "warwick homestead",
    "somerville place",
    "murkwater",
    "nordhagen",
    "bunker hill",
    "covenant",
    "county crossing",
    "finch farm",
    "the slog",
    "croup manor",
    "kingsport lighthouse",
    "egret tours",
    "boston airport",
    "outpost zimonja",
    "taffington boathouse",
    "coastal cottage",
    "homeplate",
    "home plate",
];

pub const METRO_KEYWORDS: &[&str] = &["station", "metro", "subway", "tunnel"];

/// Category keys paired with their keyword lists, in match priority order.
pub const NAME_KEYWORDS: &[(&str, &[&str])] = &[
    ("vault", VAULT_KEYWORDS),
    ("military", MILITARY_KEYWORDS),
    ("police", POLICE_KEYWORDS),
    ("city", CITY_KEYWORDS),
    ("settlement", SETTLEMENT_KEYWORDS),
    ("metro", METRO_KEYWORDS),
];

/// Editor-id fragments (lowercase) of the base objects a marker points at.
pub const EDITOR_ID_HINTS: &[(&str, &str)] = &[
    ("vault", "vault"),
    ("military", "military"),
    ("police", "police"),
    ("subway", "metro"),
    ("metro", "metro"),
    ("workshop", "settlement"),
    ("settlement", "settlement"),
    ("city", "city"),
];

pub struct MarkerTypeInfo {
    pub code: u16,
    pub name: &'static str,
    pub category: &'static str,
}

/// Map marker type codes stored in the `TNAM` field of a marker reference.
pub const MARKER_TYPE_MAP: &[MarkerTypeInfo] = &[
    MarkerTypeInfo {
        code: 1,
        name: "Cave",
        category: "poi",
    },
    MarkerTypeInfo {
        code: 2,
        name: "City",
        category: "city",
    },
    MarkerTypeInfo {
        code: 3,
        name: "Diamond City",
        category: "city",
    },
    MarkerTypeInfo {
        code: 7,
        name: "Metro",
        category: "metro",
    },
    MarkerTypeInfo {
        code: 8,
        name: "Military Base",
        category: "military",
    },
    MarkerTypeInfo {
        code: 9,
        name: "Landmark",
        category: "poi",
    },
    MarkerTypeInfo {
        code: 13,
        name: "Sanctuary",
        category: "settlement",
    },
    MarkerTypeInfo {
        code: 14,
        name: "Settlement",
        category: "settlement",
    },
    MarkerTypeInfo {
        code: 16,
        name: "Vault",
        category: "vault",
    },
    MarkerTypeInfo {
        code: 30,
        name: "Goodneighbor",
        category: "city",
    },
    MarkerTypeInfo {
        code: 53,
        name: "Bunker",
        category: "military",
    },
    MarkerTypeInfo {
        code: 54,
        name: "Castle",
        category: "military",
    },
    MarkerTypeInfo {
        code: 59,
        name: "Police Station",
        category: "police",
    },
];

pub fn get_marker_type(code: u16) -> Option<&'static MarkerTypeInfo> {
    MARKER_TYPE_MAP.iter().find(|t| t.code == code)
}
