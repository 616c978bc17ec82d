use crate::CatalogEntry;

/// Shared header for every built-in effect: the uniform contract plus the
/// color-grading and zoom/rotation helpers the bodies call into.
pub const PRELUDE: &str = include_str!("../shaders/prelude.glsl");

const BODIES: &[(&str, &str)] = &[
    ("Bubble", include_str!("../shaders/bubble.glsl")),
    ("Scramble", include_str!("../shaders/scramble.glsl")),
    ("Swirl", include_str!("../shaders/swirl.glsl")),
    ("Mirror", include_str!("../shaders/mirror.glsl")),
    ("VHS", include_str!("../shaders/vhs.glsl")),
    ("Twist", include_str!("../shaders/twist.glsl")),
    ("Time", include_str!("../shaders/time.glsl")),
    ("Bend", include_str!("../shaders/bend.glsl")),
    ("Pong", include_str!("../shaders/pong.glsl")),
    ("MouseLens", include_str!("../shaders/mouse_lens.glsl")),
];

pub fn builtin_entries() -> Vec<CatalogEntry> {
    BODIES
        .iter()
        .map(|(name, body)| CatalogEntry::new(*name, format!("{PRELUDE}\n{body}")))
        .collect()
}
