//! Beast catalog: rarities, species and stat rolls

use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::{Combatant, Element};

/// Beast and item rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Divine,
}

impl Rarity {
    /// All rarities, most common first
    pub fn all() -> &'static [Rarity] {
        &[
            Rarity::Common,
            Rarity::Uncommon,
            Rarity::Rare,
            Rarity::Epic,
            Rarity::Legendary,
            Rarity::Divine,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Divine => "Divine",
        }
    }

    /// Probability of rolling this rarity
    pub fn chance(&self) -> f64 {
        match self {
            Rarity::Common => 0.60,
            Rarity::Uncommon => 0.25,
            Rarity::Rare => 0.10,
            Rarity::Epic => 0.04,
            Rarity::Legendary => 0.009,
            Rarity::Divine => 0.001,
        }
    }

    /// Stat multiplier applied to summoned beasts
    pub fn summon_multiplier(&self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 1.2,
            Rarity::Rare => 1.5,
            Rarity::Epic => 2.0,
            Rarity::Legendary => 3.0,
            Rarity::Divine => 5.0,
        }
    }

    /// Experience multiplier applied when training
    pub fn training_multiplier(&self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 1.2,
            Rarity::Rare => 1.5,
            Rarity::Epic => 1.8,
            Rarity::Legendary => 2.0,
            Rarity::Divine => 2.5,
        }
    }

    /// Sale price of an item that is not listed on the market
    pub fn sell_value(&self) -> i64 {
        match self {
            Rarity::Common => 25,
            Rarity::Uncommon => 50,
            Rarity::Rare => 100,
            Rarity::Epic => 200,
            Rarity::Legendary => 500,
            Rarity::Divine => 1000,
        }
    }

    /// Roll a rarity weighted by its chance
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Rarity {
        Rarity::all()[RARITY_WEIGHTS.sample(rng)]
    }
}

static RARITY_WEIGHTS: LazyLock<WeightedIndex<f64>> = LazyLock::new(|| {
    WeightedIndex::new(Rarity::all().iter().map(Rarity::chance))
        .expect("rarity chances are positive")
});

impl FromStr for Rarity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rarity::all()
            .iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or(())
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Species available for an element
pub fn species(element: Element) -> &'static [&'static str] {
    match element {
        Element::Fire => &["Phoenix", "Dragon", "Hellhound", "Salamander", "Ifrit"],
        Element::Water => &["Kraken", "Leviathan", "Selkie", "Kappa", "Hydra"],
        Element::Earth => &["Griffin", "Golem", "Manticore", "Treant", "Basilisk"],
        Element::Air => &["Pegasus", "Thunderbird", "Garuda", "Sylph", "Harpy"],
        Element::Dark => &["Cerberus", "Shade", "Nightmare", "Banshee", "Wraith"],
        Element::Light => &["Unicorn", "Angel", "Kirin", "Valkyrie", "Seraph"],
    }
}

/// Random element plus a species of that element
pub fn random_species<R: Rng + ?Sized>(rng: &mut R) -> (Element, &'static str) {
    let element: Element = rng.random();
    let name = species(element).choose(rng).copied().unwrap_or_default();
    (element, name)
}

const STARTER_POWER: RangeInclusive<u32> = 10..=20;
const STARTER_HEALTH: RangeInclusive<u32> = 50..=100;
const STARTER_MAGIC: RangeInclusive<u32> = 10..=20;

const SUMMON_POWER: RangeInclusive<u32> = 15..=30;
const SUMMON_HEALTH: RangeInclusive<u32> = 80..=120;
const SUMMON_MAGIC: RangeInclusive<u32> = 15..=30;

const WILD_POWER_SPREAD: RangeInclusive<i64> = -5..=5;
const WILD_HEALTH_SPREAD: RangeInclusive<i64> = -20..=20;
const WILD_MAGIC_SPREAD: RangeInclusive<i64> = -5..=5;

/// A beast about to be inserted into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBeast {
    pub name: String,
    pub species: String,
    pub element: Element,
    pub rarity: Rarity,
    pub power: u32,
    pub health: u32,
    pub magic: u32,
}

impl NewBeast {
    /// The Common beast every new player receives
    pub fn starter<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (element, species) = random_species(rng);
        Self {
            name: species.to_string(),
            species: species.to_string(),
            element,
            rarity: Rarity::Common,
            power: rng.random_range(STARTER_POWER),
            health: rng.random_range(STARTER_HEALTH),
            magic: rng.random_range(STARTER_MAGIC),
        }
    }

    /// A summoned beast with a rolled rarity
    pub fn summoned<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let rarity = Rarity::roll(rng);
        let (element, species) = random_species(rng);
        let multiplier = rarity.summon_multiplier();
        let mut stat = |range: RangeInclusive<u32>| {
            (rng.random_range(range) as f64 * multiplier) as u32
        };

        let power = stat(SUMMON_POWER);
        let health = stat(SUMMON_HEALTH);
        let magic = stat(SUMMON_MAGIC);

        Self {
            name: species.to_string(),
            species: species.to_string(),
            element,
            rarity,
            power,
            health,
            magic,
        }
    }
}

fn spread<R: Rng + ?Sized>(base: u32, range: RangeInclusive<i64>, rng: &mut R) -> u32 {
    (base as i64 + rng.random_range(range)).max(1) as u32
}

/// A wild opponent mirroring `beast`: same level, jittered stats, random
/// element and species
pub fn wild_opponent<R: Rng + ?Sized>(beast: &Combatant, rng: &mut R) -> Combatant {
    let (element, species) = random_species(rng);
    let power = spread(beast.power, WILD_POWER_SPREAD, rng);
    let health = spread(beast.max_health(), WILD_HEALTH_SPREAD, rng);
    let magic = spread(beast.magic, WILD_MAGIC_SPREAD, rng);

    Combatant::new(species, element, beast.level, power, health, magic)
}
