// ABOUTME: Closed set of coaching personas with their style directives and sampling temperatures
// ABOUTME: Selected by id; each persona is a static record, not a behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Static description of a persona
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PersonaProfile {
    /// Stable identifier
    pub id: &'static str,
    /// Name shown to the user
    pub display_name: &'static str,
    /// System directive handed to the generative model
    pub directive: &'static str,
    /// Suggested sampling temperature
    pub temperature: f32,
    /// Short style tag
    pub style: &'static str,
}

const FRIENDLY_NUTRITIONIST: PersonaProfile = PersonaProfile {
    id: "friendly_nutritionist",
    display_name: "Friendly Nutritionist",
    directive: "You are a warm, encouraging registered dietitian giving evidence-based nutrition \
                advice. Be supportive, focus on sustainable habits, and keep the tone friendly.",
    temperature: 0.6,
    style: "friendly",
};

const STRICT_COACH: PersonaProfile = PersonaProfile {
    id: "strict_coach",
    display_name: "Strict Coach",
    directive: "You are a disciplined nutrition coach focused on results and accountability. \
                Be direct and honest, and push the user toward better choices.",
    temperature: 0.3,
    style: "strict",
};

const FUN_CHEF: PersonaProfile = PersonaProfile {
    id: "fun_chef",
    display_name: "Fun Chef",
    directive: "Think like a creative chef. Suggest colorful, culturally inspired meals with \
                spices and plating ideas while keeping them nutritious.",
    temperature: 0.8,
    style: "playful",
};

const MINDFUL_COACH: PersonaProfile = PersonaProfile {
    id: "mindful_coach",
    display_name: "Mindful Coach",
    directive: "Blend nutrition advice with mindfulness and emotional well-being. Address gaps \
                gently and favor self-kindness and balance over strict rules.",
    temperature: 0.5,
    style: "holistic",
};

/// Coaching persona
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Supportive dietitian
    #[default]
    FriendlyNutritionist,
    /// Direct, accountability-focused coach
    StrictCoach,
    /// Creative cook
    FunChef,
    /// Mindfulness-oriented coach
    MindfulCoach,
}

impl Persona {
    /// Every persona
    pub const ALL: [Self; 4] = [
        Self::FriendlyNutritionist,
        Self::StrictCoach,
        Self::FunChef,
        Self::MindfulCoach,
    ];

    /// Static record for this persona
    #[must_use]
    pub const fn profile(&self) -> &'static PersonaProfile {
        match self {
            Self::FriendlyNutritionist => &FRIENDLY_NUTRITIONIST,
            Self::StrictCoach => &STRICT_COACH,
            Self::FunChef => &FUN_CHEF,
            Self::MindfulCoach => &MINDFUL_COACH,
        }
    }

    /// Stable identifier
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.profile().id
    }

    /// System directive
    #[must_use]
    pub const fn directive(&self) -> &'static str {
        self.profile().directive
    }

    /// Suggested temperature
    #[must_use]
    pub const fn temperature(&self) -> f32 {
        self.profile().temperature
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display_name)
    }
}

impl FromStr for Persona {
    type Err = String;

    /// Accepts ids, display names, and dashed forms (`fun-chef`, `Fun Chef`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|p| p.id() == key)
            .ok_or_else(|| format!("unknown persona: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_persona() {
        assert_eq!("fun-chef".parse::<Persona>().unwrap(), Persona::FunChef);
        assert_eq!("Strict Coach".parse::<Persona>().unwrap(), Persona::StrictCoach);
        assert!("pirate".parse::<Persona>().is_err());
        assert_eq!(Persona::default(), Persona::FriendlyNutritionist);
    }

    #[test]
    fn test_temperatures() {
        let expected = [0.6_f32, 0.3, 0.8, 0.5];
        for (persona, temperature) in Persona::ALL.iter().zip(expected) {
            assert!((persona.temperature() - temperature).abs() < f32::EPSILON);
        }
    }
}
