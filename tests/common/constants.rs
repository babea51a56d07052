//! Shared constants for end-to-end tests
//!
//! IDs match the bundled demo catalog in `data/demo_catalog.json`.

// ============================================================================
// Test Users
// ============================================================================

/// Username typed at login by the main test user
pub const TEST_USER: &str = "Test User";

/// Handle derived from [`TEST_USER`]
pub const TEST_HANDLE: &str = "testuser";

/// A second user, to check namespacing
pub const OTHER_USER: &str = "other";

// ============================================================================
// Demo Catalog IDs
// ============================================================================

pub const CHANNEL_TINKERLAB_ID: &str = "c-tinkerlab";
pub const CHANNEL_KITCHEN_ID: &str = "c-slowkitchen";

pub const VIDEO_SOLDER_ID: &str = "v-solder-101";
pub const VIDEO_WEATHER_ID: &str = "v-esp-weather";
pub const VIDEO_SOURDOUGH_ID: &str = "v-sourdough";
pub const VIDEO_RAGU_ID: &str = "v-ragu";

// ============================================================================
// Storage keys
// ============================================================================

pub const SESSION_KEY: &str = "current_user";
pub const ANONYMOUS_LIKED_KEY: &str = "liked_videos_anonymous";
pub const TEST_USER_LIKED_KEY: &str = "liked_videos_testuser";
pub const TEST_USER_HISTORY_KEY: &str = "watch_history_testuser";
