/// Overlay palette, icon metrics and label styling, all RGBA.
pub type Rgba = [u8; 4];

pub const ICON_WHITE: Rgba = [240, 240, 230, 245];
pub const OUTLINE_DARK: Rgba = [10, 10, 5, 200];
pub const TEXT_SHADOW: Rgba = [0, 0, 0, 160];
pub const WHITE_DIM: Rgba = [210, 210, 200, 230];

pub const GRID_COLOR: Rgba = [160, 160, 160, 30];
pub const GRID_LABEL_COLOR: Rgba = [180, 175, 160, 120];
pub const BORDER_COLOR: Rgba = [50, 45, 30, 150];

pub const WATERMARK_COLOR: Rgba = [160, 160, 160, 50];
pub const WATERMARK_SHADOW: Rgba = [0, 0, 0, 30];

/// Dashed border stroke, in final-resolution pixels.
pub const BORDER_WIDTH: u32 = 2;
pub const BORDER_DASH: u32 = 30;
pub const BORDER_GAP: u32 = 15;

/// Label drop shadow offset, in final-resolution pixels.
pub const SHADOW_OFFSET: i32 = 3;

/// Glyph heights for label text, in final-resolution pixels.
pub const FONT_MAJOR_PX: u32 = 40;
pub const FONT_REGULAR_PX: u32 = 32;
pub const FONT_GRID_PX: u32 = 40;
pub const FONT_WATERMARK_PX: u32 = 18;

/// Icon outline grows by this much on each side, in final-resolution pixels.
pub const OUTLINE_GROW: u32 = 2;

/// Glyph height of the folded-collectible count next to badges.
pub const FONT_BADGE_PX: u32 = 16;

/// Horizontal pitch of badge icons below a host marker.
pub const BADGE_SPACING: u32 = 20;

/// Display style of one location category.
pub struct CategoryStyle {
    pub key: &'static str,
    pub icon_size: u32,
    pub label_color: Rgba,
    /// Lower values are labelled first; `None` means the category is not labelled.
    pub label_priority: Option<u8>,
    pub major: bool,
}

pub const CATEGORY_STYLES: &[CategoryStyle] = &[
    CategoryStyle {
        key: "city",
        icon_size: 26,
        label_color: [230, 220, 180, 255],
        label_priority: Some(0),
        major: true,
    },
    CategoryStyle {
        key: "vault",
        icon_size: 26,
        label_color: [70, 140, 230, 255],
        label_priority: Some(1),
        major: true,
    },
    CategoryStyle {
        key: "military",
        icon_size: 24,
        label_color: [220, 60, 50, 255],
        label_priority: Some(2),
        major: true,
    },
    CategoryStyle {
        key: "settlement",
        icon_size: 24,
        label_color: [90, 200, 90, 255],
        label_priority: Some(3),
        major: false,
    },
    CategoryStyle {
        key: "metro",
        icon_size: 20,
        label_color: [60, 200, 200, 255],
        label_priority: Some(4),
        major: false,
    },
    CategoryStyle {
        key: "police",
        icon_size: 20,
        label_color: [100, 155, 230, 255],
        label_priority: Some(5),
        major: false,
    },
    CategoryStyle {
        key: "poi",
        icon_size: 14,
        label_color: [200, 180, 100, 200],
        label_priority: None,
        major: false,
    },
    CategoryStyle {
        key: "other",
        icon_size: 14,
        label_color: [170, 170, 160, 200],
        label_priority: None,
        major: false,
    },
];

/// Display style of one collectible kind.
pub struct CollectibleStyle {
    pub key: &'static str,
    pub icon_size: u32,
    pub color: Rgba,
}

pub const COLLECTIBLE_STYLES: &[CollectibleStyle] = &[
    CollectibleStyle {
        key: "bobblehead",
        icon_size: 16,
        color: [240, 220, 60, 255],
    },
    CollectibleStyle {
        key: "magazine",
        icon_size: 14,
        color: [200, 110, 200, 255],
    },
    CollectibleStyle {
        key: "power_armor",
        icon_size: 16,
        color: [240, 170, 50, 255],
    },
    CollectibleStyle {
        key: "fusion_core",
        icon_size: 10,
        color: [80, 220, 240, 255],
    },
    CollectibleStyle {
        key: "trader",
        icon_size: 14,
        color: [200, 175, 60, 255],
    },
];

pub fn get_category_style(key: &str) -> Option<&'static CategoryStyle> {
    CATEGORY_STYLES.iter().find(|s| s.key == key)
}

pub fn get_collectible_style(key: &str) -> Option<&'static CollectibleStyle> {
    COLLECTIBLE_STYLES.iter().find(|s| s.key == key)
}
