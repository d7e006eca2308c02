//! Elements and the effectiveness table
//!
//! Every beast belongs to one of six elements. Attacks between elements are
//! scaled by a static table:
//! - Advantage (120% damage)
//! - Neutral (100% damage)
//! - Disadvantage (80% damage)

use rand::distr::{Distribution, StandardUniform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Beast elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Water,
    Earth,
    Air,
    Dark,
    Light,
}

impl Element {
    /// Get all elements in table order
    pub fn all() -> &'static [Element] {
        &[
            Element::Fire,
            Element::Water,
            Element::Earth,
            Element::Air,
            Element::Dark,
            Element::Light,
        ]
    }

    /// Name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Fire => "Fire",
            Element::Water => "Water",
            Element::Earth => "Earth",
            Element::Air => "Air",
            Element::Dark => "Dark",
            Element::Light => "Light",
        }
    }
}

/// Uniform over all six elements, so `rng.random::<Element>()` works
impl Distribution<Element> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Element {
        let all = Element::all();
        all[rng.random_range(0..all.len())]
    }
}

impl FromStr for Element {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fire" => Ok(Element::Fire),
            "water" => Ok(Element::Water),
            "earth" => Ok(Element::Earth),
            "air" => Ok(Element::Air),
            "dark" => Ok(Element::Dark),
            "light" => Ok(Element::Light),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How well an attacking element fares against a defending one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effectiveness {
    /// Deals 120% damage
    Advantage,
    /// Deals 100% damage
    Neutral,
    /// Deals 80% damage
    Disadvantage,
}

impl Effectiveness {
    /// Damage multiplier for this effectiveness
    pub fn multiplier(&self) -> f64 {
        match self {
            Effectiveness::Advantage => 1.2,
            Effectiveness::Neutral => 1.0,
            Effectiveness::Disadvantage => 0.8,
        }
    }

    /// Look up the effectiveness of an attacker against a defender.
    /// Pairs that are not listed are neutral.
    pub fn of(attacker: Element, defender: Element) -> Effectiveness {
        use Element::*;

        match (attacker, defender) {
            (Fire, Air) | (Water, Fire) | (Earth, Water) | (Air, Earth) => Effectiveness::Advantage,
            (Dark, Light) | (Light, Dark) => Effectiveness::Advantage,
            (Fire, Water) | (Water, Earth) | (Earth, Air) | (Air, Fire) => {
                Effectiveness::Disadvantage
            }
            (Dark, Dark) | (Light, Light) => Effectiveness::Disadvantage,
            _ => Effectiveness::Neutral,
        }
    }
}

/// Damage multiplier for an attacker against a defender
pub fn effectiveness_of(attacker: Element, defender: Element) -> f64 {
    Effectiveness::of(attacker, defender).multiplier()
}
