// ── Input limits ─────────────────────────────────────────

pub const MAX_USER_LEN: usize = 128;
pub const MAX_DESCRIPTOR_LEN: usize = 64;
pub const MAX_SPOT_ID_LEN: usize = 32;
pub const MAX_GATE_NAME_LEN: usize = 32;

// ── Layout limits ────────────────────────────────────────

pub const MAX_ZONES: u32 = 64;
pub const MAX_SPOTS_PER_ZONE: u32 = 999;
pub const MAX_GATES: usize = 64;

// ── Lot manager limits ───────────────────────────────────

pub const MAX_LOTS: usize = 1024;
pub const MAX_LOT_NAME_LEN: usize = 128;
