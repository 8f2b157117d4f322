/// Game configuration constants and tunable rules.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// AP granted at the start of each turn.
    pub action_points: u32,
    /// AP cost of a single tile of movement.
    pub move_ap_cost: u32,
    /// AP cost of a basic weapon attack.
    pub attack_ap_cost: u32,
    /// Dispel attempts per casting before upgrades.
    pub dispel_attempts: u32,
    /// Iteration cap for every AI movement loop.
    pub movement_loop_guard: u32,
    /// A friendly below this HP percentage makes heal abilities eligible.
    pub heal_threshold_percent: u32,
    /// Total defense triggers when strictly more hostiles than this are adjacent.
    pub surrounded_threshold: usize,
    /// Tiles within which an encounter notices a visible hostile.
    pub detection_range: u32,
    /// Armor class before ledger bonuses.
    pub base_armor_class: i32,
    /// Tiles per second for projectile-synchronized callbacks.
    pub projectile_speed: f32,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_SLOTS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ACTION_POINTS: u32 = 6;
    pub const DEFAULT_MOVE_AP_COST: u32 = 1;
    pub const DEFAULT_ATTACK_AP_COST: u32 = 3;
    pub const DEFAULT_DISPEL_ATTEMPTS: u32 = 2;
    pub const DEFAULT_MOVEMENT_LOOP_GUARD: u32 = 30;
    pub const DEFAULT_HEAL_THRESHOLD_PERCENT: u32 = 50;
    pub const DEFAULT_SURROUNDED_THRESHOLD: usize = 2;
    pub const DEFAULT_DETECTION_RANGE: u32 = 8;
    pub const DEFAULT_BASE_ARMOR_CLASS: i32 = 10;
    pub const DEFAULT_PROJECTILE_SPEED: f32 = 12.0;

    pub fn new() -> Self {
        Self {
            action_points: Self::DEFAULT_ACTION_POINTS,
            move_ap_cost: Self::DEFAULT_MOVE_AP_COST,
            attack_ap_cost: Self::DEFAULT_ATTACK_AP_COST,
            dispel_attempts: Self::DEFAULT_DISPEL_ATTEMPTS,
            movement_loop_guard: Self::DEFAULT_MOVEMENT_LOOP_GUARD,
            heal_threshold_percent: Self::DEFAULT_HEAL_THRESHOLD_PERCENT,
            surrounded_threshold: Self::DEFAULT_SURROUNDED_THRESHOLD,
            detection_range: Self::DEFAULT_DETECTION_RANGE,
            base_armor_class: Self::DEFAULT_BASE_ARMOR_CLASS,
            projectile_speed: Self::DEFAULT_PROJECTILE_SPEED,
        }
    }

    /// Heal threshold as a fraction in `0.0..=1.0`.
    pub fn heal_threshold(&self) -> f32 {
        self.heal_threshold_percent.min(100) as f32 / 100.0
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
