//! Static cycleZ brand rule set: brand allow/deny lists, keyword lists, and the
//! situation/persona/mood lookup tables that drive prompt composition.
//!
//! Everything here is immutable process-wide data. Lookups self-heal: an
//! unknown key resolves to a designated default instead of surfacing an error
//! to the caller.

/// Bicycle brands that may be named in generated prompts.
pub const PREFERRED_BIKE_BRANDS: &[&str] = &[
    "GIOS", "BASSO", "SCOTT", "DEROSA", "WILIER", "Cervelo", "BISYA", "SURLY", "MATE", "TOKYOBIKE",
];

/// Apparel and accessory brands that may be named in generated prompts.
pub const PREFERRED_APPAREL_BRANDS: &[&str] = &[
    "STEMDESIGN", "ASSOS", "RINPROJECT", "CHROME", "CCP", "ISADORE", "ALBA Optics",
];

/// Bicycle brands that must never appear in any prompt.
pub const FORBIDDEN_BIKE_BRANDS: &[&str] = &[
    "Specialized", "Trek", "Colnago", "GIANT", "PINARELLO", "Bianchi", "Cannondale", "MERIDA",
    "ANCHOR",
];

/// Apparel brands that must never appear in any prompt.
pub const FORBIDDEN_APPAREL_BRANDS: &[&str] = &["Rapha", "Pearl Izumi"];

/// Tone keywords the prompt should draw from.
pub const PREFERRED_KEYWORDS: &[&str] = &[
    "casual cycling", "lifestyle", "urban commute", "weekend ride", "stylish", "approachable",
    "friendly staff", "comfortable", "enjoyable", "hobby", "leisure", "natural light",
    "clean shop interior", "modern", "welcoming atmosphere",
];

/// Tone keywords the prompt must avoid.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "racing", "competitive", "intense", "aggressive", "extreme", "championship", "aero",
    "time trial", "velodrome", "peloton", "pro team", "professional",
];

/// The only staff member whose glasses appearance varies between reference
/// photos; the glasses override is meaningful for this member alone.
pub const GLASSES_STAFF_ID: &str = "okada";

/// Full brand-guidelines block injected into the text-generation system prompt.
pub const BRAND_GUIDELINES: &str = r#"## cycleZ brand guidelines

### Concept
A sports-bicycle shop that proposes cycling as a way to enrich everyday life.
Beginner-friendly, never hardcore: cycling as an enjoyable hobby, not a sport to
suffer for.

### Target audience
- University students in their early 20s (commuting, cycling as a hobby)
- Men and women in their 50s (health-conscious, cycling as a hobby)

### Brand colors
- Main: #e63232 (red)
- Sub: #1a1a1a (black), #ffffff (white)
- Accent: #f0d000 (yellow)

### Photo tone
Bright, clean shop spaces, natural light, an approachable atmosphere, the feel
of enjoying a hobby.

### Bicycle brands to feature (use actively)
GIOS, BASSO, SCOTT, DEROSA, WILIER, Cervelo, BISYA, SURLY, MATE, TOKYOBIKE

### Apparel and accessory brands to feature (use actively)
STEMDESIGN, ASSOS, RINPROJECT, CHROME, CCP, ISADORE, ALBA Optics

### Strictly forbidden visuals and brands
- Race-team or hardcore-competitive atmosphere
- Rapha apparel
- Pearl Izumi apparel
- Bicycles from: Specialized, Trek, Colnago, GIANT, PINARELLO, Bianchi, Cannondale, MERIDA, ANCHOR
- Aggressive pro-racer poses
- Flashy racing equipment
- An overly expensive or specialist impression
- Sweat-drenched hard-training scenes

### Visuals to aim for
- Customers happily browsing bikes inside the shop
- Careful, professional fitting sessions
- Attentive staff advising on test rides
- Casual, fashionable cycling wear
- Stylish bikes that also work for commuting
- The relaxed mood of a weekend long ride

### Keywords to use in prompts
casual cycling, lifestyle, urban commute, weekend ride, stylish, approachable,
friendly staff, comfortable, enjoyable, hobby, leisure, natural light,
clean shop interior, modern, welcoming atmosphere

### Keywords to avoid in prompts
racing, competitive, professional, intense, aggressive, extreme, championship,
aero, time trial, velodrome, peloton, pro team
"#;

/// Scene/action/mood fragments for one situation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SituationProfile {
    pub key: &'static str,
    pub scene: &'static str,
    pub action: &'static str,
    pub mood: &'static str,
}

/// The situation substituted when an unknown key is looked up.
pub const DEFAULT_SITUATION_KEY: &str = "test_ride_consultation";

pub const SITUATIONS: &[SituationProfile] = &[
    SituationProfile {
        key: "bike_fitting",
        scene: "professional bike fitting session in a modern bicycle shop",
        action: "staff carefully adjusting saddle height and handlebar position, customer sitting on bike in fitting area",
        mood: "professional yet approachable, expert service",
    },
    SituationProfile {
        key: "test_ride_consultation",
        scene: "bright bicycle shop showroom with various bikes on display",
        action: "staff explaining bike features to interested customer, gesturing towards the bicycle, casual conversation",
        mood: "friendly consultation, no pressure sales atmosphere",
    },
    SituationProfile {
        key: "maintenance_explanation",
        scene: "service area of a bicycle shop with tools and workstand",
        action: "staff explaining maintenance procedures, showing parts or demonstrating techniques",
        mood: "educational, helpful, building trust",
    },
    SituationProfile {
        key: "parts_accessories",
        scene: "accessory display area with helmets, lights, bags, and cycling gear",
        action: "staff helping customer choose accessories, showing different options",
        mood: "helpful guidance, lifestyle-focused recommendations",
    },
    SituationProfile {
        key: "beginner_consultation",
        scene: "welcoming entrance area of bicycle shop",
        action: "staff warmly greeting newcomer, explaining basics with patience and smile",
        mood: "beginner-friendly, zero intimidation, encouraging",
    },
    SituationProfile {
        key: "commuter_bike",
        scene: "urban-style bikes display area, commuter and city bikes",
        action: "staff presenting practical commuter bike options, discussing daily use features",
        mood: "practical, lifestyle integration, daily convenience",
    },
    SituationProfile {
        key: "long_ride",
        scene: "road bike section of the shop with endurance and touring bikes",
        action: "staff and customer discussing route planning and bike setup for comfortable long rides",
        mood: "adventure-oriented but relaxed, weekend warrior spirit",
    },
    SituationProfile {
        key: "apparel_consultation",
        scene: "cycling apparel section with stylish jerseys, casual cycling wear",
        action: "staff showing fashionable cycling clothing options, customer browsing",
        mood: "fashion-conscious, casual style, not racing-focused",
    },
    SituationProfile {
        key: "interior",
        scene: "clean, modern bicycle shop interior with natural light, organized bike displays",
        action: "empty space showcasing shop layout, bikes arranged beautifully",
        mood: "inviting, organized, premium yet approachable",
    },
    SituationProfile {
        key: "bike_display",
        scene: "featured bikes on display stands, spotlight on specific models",
        action: "artistic arrangement of bicycles, showing craftsmanship and design",
        mood: "aesthetic, aspirational but attainable",
    },
];

/// One-sentence customer description for one persona key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaProfile {
    pub key: &'static str,
    pub description: &'static str,
}

pub const PERSONAS: &[PersonaProfile] = &[
    PersonaProfile {
        key: "early_20s_male_student",
        description: "a Japanese male university student in his early 20s, smart casual look, curious and analytical expression, wearing casual clothes",
    },
    PersonaProfile {
        key: "early_20s_female_student",
        description: "a Japanese female university student in her early 20s, intelligent appearance, interested in practical cycling solutions, wearing casual clothes",
    },
    PersonaProfile {
        key: "50s_male",
        description: "a Japanese man in his 50s, health-conscious, looking for quality hobby bike, relaxed weekend style",
    },
    PersonaProfile {
        key: "50s_female",
        description: "a Japanese woman in her 50s, active lifestyle, interested in comfortable cycling, elegant casual appearance",
    },
    PersonaProfile {
        key: "30s_male",
        description: "a Japanese man in his 30s, urban professional, interested in commuter or weekend cycling",
    },
    PersonaProfile {
        key: "30s_female",
        description: "a Japanese woman in her 30s, lifestyle-conscious, looking for stylish cycling options",
    },
    PersonaProfile {
        key: "40s_male",
        description: "a Japanese man in his 40s, established professional, seeking quality hobby bike",
    },
    PersonaProfile {
        key: "40s_female",
        description: "a Japanese woman in her 40s, health and lifestyle focused, interested in comfortable cycling",
    },
];

/// Atmosphere fragment for one mood key, ordered calm to lively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodProfile {
    pub key: &'static str,
    pub description: &'static str,
}

pub const DEFAULT_MOOD_KEY: &str = "neutral";

pub const MOODS: &[MoodProfile] = &[
    MoodProfile {
        key: "calm",
        description: "calm and serene atmosphere, soft diffused lighting, peaceful shop environment",
    },
    MoodProfile {
        key: "slightly_calm",
        description: "relaxed professional atmosphere, natural soft lighting, comfortable feel",
    },
    MoodProfile {
        key: "neutral",
        description: "balanced neutral atmosphere, even natural lighting, welcoming",
    },
    MoodProfile {
        key: "slightly_lively",
        description: "gently energetic atmosphere, brighter natural light, enthusiasm for cycling",
    },
    MoodProfile {
        key: "lively",
        description: "positive lively atmosphere, bright daylight, excitement about bikes and cycling lifestyle",
    },
];

/// Resolves a situation key, substituting the default situation for unknown
/// keys rather than failing.
pub fn lookup_situation(key: &str) -> &'static SituationProfile {
    SITUATIONS
        .iter()
        .find(|profile| profile.key == key)
        .unwrap_or_else(|| {
            SITUATIONS
                .iter()
                .find(|profile| profile.key == DEFAULT_SITUATION_KEY)
                .unwrap_or(&SITUATIONS[0])
        })
}

/// Resolves a persona key; unknown keys yield an empty description.
pub fn lookup_persona(key: &str) -> &'static str {
    PERSONAS
        .iter()
        .find(|profile| profile.key == key)
        .map(|profile| profile.description)
        .unwrap_or("")
}

/// Resolves a mood key, substituting the neutral mood for unknown keys.
pub fn lookup_mood(key: &str) -> &'static MoodProfile {
    MOODS
        .iter()
        .find(|profile| profile.key == key)
        .unwrap_or_else(|| {
            MOODS
                .iter()
                .find(|profile| profile.key == DEFAULT_MOOD_KEY)
                .unwrap_or(&MOODS[0])
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_situation_falls_back_to_default() {
        let profile = lookup_situation("__unknown__");
        assert_eq!(profile.key, DEFAULT_SITUATION_KEY);
    }

    #[test]
    fn known_situation_resolves_itself() {
        let profile = lookup_situation("bike_fitting");
        assert_eq!(profile.key, "bike_fitting");
        assert!(profile.scene.contains("fitting"));
    }

    #[test]
    fn unknown_persona_yields_empty_description() {
        assert_eq!(lookup_persona("__unknown__"), "");
        assert!(lookup_persona("30s_male").contains("Japanese man in his 30s"));
    }

    #[test]
    fn unknown_mood_falls_back_to_neutral() {
        let profile = lookup_mood("__unknown__");
        assert_eq!(profile.key, DEFAULT_MOOD_KEY);
    }

    #[test]
    fn preferred_and_forbidden_brand_sets_are_disjoint() {
        for brand in PREFERRED_BIKE_BRANDS {
            assert!(!FORBIDDEN_BIKE_BRANDS.contains(brand));
        }
        for brand in PREFERRED_APPAREL_BRANDS {
            assert!(!FORBIDDEN_APPAREL_BRANDS.contains(brand));
        }
    }

    #[test]
    fn tables_cover_the_fixed_option_counts() {
        assert_eq!(SITUATIONS.len(), 10);
        assert_eq!(PERSONAS.len(), 8);
        assert_eq!(MOODS.len(), 5);
    }
}
