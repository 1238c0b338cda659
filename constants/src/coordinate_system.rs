/// Commonwealth worldspace extents covered by the map texture (62x62 cells, square).
pub const WORLD_X_MIN: f64 = -135168.0;
pub const WORLD_X_MAX: f64 = 118784.0;
pub const WORLD_Y_MIN: f64 = -147456.0;
pub const WORLD_Y_MAX: f64 = 106496.0;

/// Width of one grid square in world units (one cell column / row label).
pub const GRID_SPACING: f64 = 8192.0;

/// Inset of the dashed playable-area border from the world edges.
pub const BORDER_INSET: f64 = 8192.0;

/// Grid lines closer than this to the canvas edge are skipped (final pixels).
pub const GRID_EDGE_MARGIN_PX: u32 = 60;

/// Collectibles further than this from every location stand on their own (world units).
/// Matches a 300 px radius on the 8192 px map.
pub const GROUP_THRESHOLD: f64 = 9300.0;

/// Location markers from different data files closer than this are duplicates (final pixels).
pub const DEDUP_RADIUS_PX: f64 = 120.0;
