//! Perks - named, tiered modifiers and their rule hooks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every perk the engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerkKind {
    BladeSpecialist,
    AxeAndBluntSpecialist,
    SpearSpecialist,
    Duelist,
    ShieldSpecialist,
    SteelTempest,
    SwornSword,
    Bloodlust,
    Berserker,
    BowSpecialist,
    CrossbowSpecialist,
    Marksman,
    ThrownProjectileSpecialist,
    BattlefieldChampion,
    FavoredByFortune,
    Indomitable,
    AgeingWithGrace,
    HeroicStand,
    TerrifyingPresence,
}

impl PerkKind {
    pub fn all() -> &'static [PerkKind] {
        use PerkKind::*;
        &[
            BladeSpecialist,
            AxeAndBluntSpecialist,
            SpearSpecialist,
            Duelist,
            ShieldSpecialist,
            SteelTempest,
            SwornSword,
            Bloodlust,
            Berserker,
            BowSpecialist,
            CrossbowSpecialist,
            Marksman,
            ThrownProjectileSpecialist,
            BattlefieldChampion,
            FavoredByFortune,
            Indomitable,
            AgeingWithGrace,
            HeroicStand,
            TerrifyingPresence,
        ]
    }

    /// Display name as written on character sheets
    pub fn name(self) -> &'static str {
        match self {
            PerkKind::BladeSpecialist => "Blade Specialist",
            PerkKind::AxeAndBluntSpecialist => "Axe and Blunt Specialist",
            PerkKind::SpearSpecialist => "Spear Specialist",
            PerkKind::Duelist => "Duelist",
            PerkKind::ShieldSpecialist => "Shield Specialist",
            PerkKind::SteelTempest => "Steel Tempest",
            PerkKind::SwornSword => "Sworn Sword",
            PerkKind::Bloodlust => "Bloodlust",
            PerkKind::Berserker => "Berserker",
            PerkKind::BowSpecialist => "Bow Specialist",
            PerkKind::CrossbowSpecialist => "Crossbow Specialist",
            PerkKind::Marksman => "Marksman",
            PerkKind::ThrownProjectileSpecialist => "Thrown Projectile Specialist",
            PerkKind::BattlefieldChampion => "Battlefield Champion",
            PerkKind::FavoredByFortune => "Favored by Fortune",
            PerkKind::Indomitable => "Indomitable",
            PerkKind::AgeingWithGrace => "Ageing With Grace",
            PerkKind::HeroicStand => "Heroic Stand",
            PerkKind::TerrifyingPresence => "Terrifying Presence",
        }
    }

    /// Resolve a perk name or alias, ignoring case. Aliases may pin a tier.
    fn from_name(name: &str) -> Option<(PerkKind, Option<u8>)> {
        let lowered = name.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "born lucky" => return Some((PerkKind::FavoredByFortune, Some(1))),
            "favoured by fortune" => return Some((PerkKind::FavoredByFortune, None)),
            "imposing presence" => return Some((PerkKind::TerrifyingPresence, None)),
            "fear the old man" => return Some((PerkKind::HeroicStand, None)),
            "axe/blunt specialist" | "axe & blunt specialist" => {
                return Some((PerkKind::AxeAndBluntSpecialist, None))
            }
            _ => {}
        }
        PerkKind::all()
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&lowered))
            .map(|&kind| (kind, None))
    }
}

impl fmt::Display for PerkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A perk held at a tier (1-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Perk {
    pub kind: PerkKind,
    pub tier: u8,
}

impl Perk {
    pub fn new(kind: PerkKind, tier: u8) -> Self {
        Perk {
            kind,
            tier: tier.clamp(1, 3),
        }
    }
}

impl fmt::Display for Perk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} T{}", self.kind, self.tier)
    }
}

/// Failure to recognise a perk string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPerk(pub String);

impl fmt::Display for UnknownPerk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown perk '{}'", self.0)
    }
}

impl FromStr for Perk {
    type Err = UnknownPerk;

    /// Parse `"Blade Specialist T2"`, `"duelist"` (tier 1) or an alias
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (name, tier) = split_tier(trimmed);
        let (kind, pinned) =
            PerkKind::from_name(name).ok_or_else(|| UnknownPerk(trimmed.to_string()))?;
        Ok(Perk::new(kind, pinned.or(tier).unwrap_or(1)))
    }
}

/// Split a trailing `T1`..`T3` tier marker off a perk string
fn split_tier(s: &str) -> (&str, Option<u8>) {
    if let Some((name, suffix)) = s.rsplit_once(' ') {
        let suffix = suffix.trim_start_matches('(').trim_end_matches(')');
        if let Some(digits) = suffix.strip_prefix(['T', 't']) {
            if let Ok(tier @ 1..=3) = digits.parse::<u8>() {
                return (name.trim_end(), Some(tier));
            }
        }
    }
    (s, None)
}

/// The perks a combatant holds, at most one tier per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerkSet {
    perks: Vec<Perk>,
}

impl PerkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a perk, keeping the higher tier if the kind is already held
    pub fn insert(&mut self, perk: Perk) {
        match self.perks.iter_mut().find(|p| p.kind == perk.kind) {
            Some(existing) => existing.tier = existing.tier.max(perk.tier),
            None => self.perks.push(perk),
        }
    }

    /// Tier held for a kind, if any
    pub fn tier(&self, kind: PerkKind) -> Option<u8> {
        self.perks.iter().find(|p| p.kind == kind).map(|p| p.tier)
    }

    pub fn has(&self, kind: PerkKind) -> bool {
        self.tier(kind).is_some()
    }

    /// Whether the kind is held at `tier` or above
    pub fn has_tier(&self, kind: PerkKind, tier: u8) -> bool {
        self.tier(kind).is_some_and(|held| held >= tier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Perk> {
        self.perks.iter()
    }

    pub fn len(&self) -> usize {
        self.perks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perks.is_empty()
    }
}

impl FromIterator<Perk> for PerkSet {
    fn from_iter<I: IntoIterator<Item = Perk>>(iter: I) -> Self {
        let mut set = PerkSet::new();
        for perk in iter {
            set.insert(perk);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_tier() {
        let perk: Perk = "Blade Specialist T2".parse().unwrap();
        assert_eq!(perk, Perk::new(PerkKind::BladeSpecialist, 2));
    }

    #[test]
    fn test_parse_default_tier_and_case() {
        let perk: Perk = "  duelist ".parse().unwrap();
        assert_eq!(perk, Perk::new(PerkKind::Duelist, 1));

        let perk: Perk = "THROWN PROJECTILE SPECIALIST t3".parse().unwrap();
        assert_eq!(perk, Perk::new(PerkKind::ThrownProjectileSpecialist, 3));
    }

    #[test]
    fn test_parse_aliases() {
        let perk: Perk = "Born Lucky".parse().unwrap();
        assert_eq!(perk, Perk::new(PerkKind::FavoredByFortune, 1));

        let perk: Perk = "Favoured by Fortune T2".parse().unwrap();
        assert_eq!(perk, Perk::new(PerkKind::FavoredByFortune, 2));

        let perk: Perk = "Imposing Presence T2".parse().unwrap();
        assert_eq!(perk.kind, PerkKind::TerrifyingPresence);

        let perk: Perk = "Fear the Old Man".parse().unwrap();
        assert_eq!(perk.kind, PerkKind::HeroicStand);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Dragon Rider T1".parse::<Perk>().unwrap_err();
        assert_eq!(err, UnknownPerk("Dragon Rider T1".to_string()));
    }

    #[test]
    fn test_out_of_range_tier_is_part_of_name() {
        assert!("Duelist T9".parse::<Perk>().is_err());
    }

    #[test]
    fn test_set_keeps_highest_tier() {
        let set: PerkSet = [
            Perk::new(PerkKind::Indomitable, 1),
            Perk::new(PerkKind::Indomitable, 3),
            Perk::new(PerkKind::Indomitable, 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set.tier(PerkKind::Indomitable), Some(3));
        assert!(set.has_tier(PerkKind::Indomitable, 3));
        assert!(!set.has(PerkKind::Duelist));
    }

    #[test]
    fn test_display_round_trips() {
        for &kind in PerkKind::all() {
            let perk = Perk::new(kind, 2);
            assert_eq!(perk.to_string().parse::<Perk>().unwrap(), perk);
        }
    }
}
