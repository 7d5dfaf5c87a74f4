// Default streaming radii, in chunks, measured by Chebyshev distance from
// the camera chunk. Overridden at runtime by `WorldConfig::view_distance`
// (see config.rs); these are the values a freshly-created config starts at.
pub const DEFAULT_VIEW_DISTANCE: i32 = 8;
pub const VIEW_DISTANCE_UNLOAD_MARGIN: i32 = 2;

pub const fn unload_distance(view_distance: i32) -> i32 {
    view_distance + VIEW_DISTANCE_UNLOAD_MARGIN
}

// TODO: separate Y-axis view distance once worldgen needs more than a single
// vertical chunk column.
