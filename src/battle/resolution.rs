//! Attack resolution math

/// Damage for one basic attack
///
/// At least 1 before escalation, then scaled and rounded to the nearest
/// integer.
pub fn compute_damage(attack: f32, defense: f32, multiplier: f32) -> i32 {
    let raw = (attack - defense).max(1.0);
    (raw * multiplier).round() as i32
}

/// Seconds between attacks for a given attack speed
pub fn attack_cooldown(attack_speed: f32, min_attack_speed: f32) -> f32 {
    1.0 / attack_speed.max(min_attack_speed)
}
