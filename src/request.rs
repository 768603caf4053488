//! The immutable generation request assembled by the front end once per
//! generation action, plus the fixed option enums it is built from.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::brand;

/// What the generated image is for. Only steers the external brief; the local
/// template path does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    PromotionalStaff,
    Instagram,
    ShopInterior,
    Product,
    Custom,
}

impl Purpose {
    pub fn as_key(&self) -> &'static str {
        match self {
            Purpose::PromotionalStaff => "promotional_staff",
            Purpose::Instagram => "instagram",
            Purpose::ShopInterior => "shop_interior",
            Purpose::Product => "product",
            Purpose::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Purpose::PromotionalStaff => "promotional material featuring shop staff",
            Purpose::Instagram => "an Instagram post",
            Purpose::ShopInterior => "a shop interior showcase",
            Purpose::Product => "a product feature",
            Purpose::Custom => "a custom marketing visual",
        }
    }
}

impl FromStr for Purpose {
    type Err = UnknownOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "promotional_staff" => Ok(Purpose::PromotionalStaff),
            "instagram" => Ok(Purpose::Instagram),
            "shop_interior" => Ok(Purpose::ShopInterior),
            "product" => Ok(Purpose::Product),
            "custom" => Ok(Purpose::Custom),
            other => Err(UnknownOptionError::new("purpose", other)),
        }
    }
}

/// One of the ten fixed scenario categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Situation {
    BikeFitting,
    TestRideConsultation,
    MaintenanceExplanation,
    PartsAccessories,
    BeginnerConsultation,
    CommuterBike,
    LongRide,
    ApparelConsultation,
    Interior,
    BikeDisplay,
}

impl Situation {
    pub fn as_key(&self) -> &'static str {
        match self {
            Situation::BikeFitting => "bike_fitting",
            Situation::TestRideConsultation => "test_ride_consultation",
            Situation::MaintenanceExplanation => "maintenance_explanation",
            Situation::PartsAccessories => "parts_accessories",
            Situation::BeginnerConsultation => "beginner_consultation",
            Situation::CommuterBike => "commuter_bike",
            Situation::LongRide => "long_ride",
            Situation::ApparelConsultation => "apparel_consultation",
            Situation::Interior => "interior",
            Situation::BikeDisplay => "bike_display",
        }
    }

    pub fn profile(&self) -> &'static brand::SituationProfile {
        brand::lookup_situation(self.as_key())
    }
}

impl FromStr for Situation {
    type Err = UnknownOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bike_fitting" => Ok(Situation::BikeFitting),
            "test_ride_consultation" => Ok(Situation::TestRideConsultation),
            "maintenance_explanation" => Ok(Situation::MaintenanceExplanation),
            "parts_accessories" => Ok(Situation::PartsAccessories),
            "beginner_consultation" => Ok(Situation::BeginnerConsultation),
            "commuter_bike" => Ok(Situation::CommuterBike),
            "long_ride" => Ok(Situation::LongRide),
            "apparel_consultation" => Ok(Situation::ApparelConsultation),
            "interior" => Ok(Situation::Interior),
            "bike_display" => Ok(Situation::BikeDisplay),
            other => Err(UnknownOptionError::new("situation", other)),
        }
    }
}

/// One of the eight fixed customer archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Early20sMaleStudent,
    Early20sFemaleStudent,
    FiftiesMale,
    FiftiesFemale,
    ThirtiesMale,
    ThirtiesFemale,
    FortiesMale,
    FortiesFemale,
}

impl ClientType {
    pub fn as_key(&self) -> &'static str {
        match self {
            ClientType::Early20sMaleStudent => "early_20s_male_student",
            ClientType::Early20sFemaleStudent => "early_20s_female_student",
            ClientType::FiftiesMale => "50s_male",
            ClientType::FiftiesFemale => "50s_female",
            ClientType::ThirtiesMale => "30s_male",
            ClientType::ThirtiesFemale => "30s_female",
            ClientType::FortiesMale => "40s_male",
            ClientType::FortiesFemale => "40s_female",
        }
    }

    pub fn description(&self) -> &'static str {
        brand::lookup_persona(self.as_key())
    }
}

impl FromStr for ClientType {
    type Err = UnknownOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "early_20s_male_student" => Ok(ClientType::Early20sMaleStudent),
            "early_20s_female_student" => Ok(ClientType::Early20sFemaleStudent),
            "50s_male" => Ok(ClientType::FiftiesMale),
            "50s_female" => Ok(ClientType::FiftiesFemale),
            "30s_male" => Ok(ClientType::ThirtiesMale),
            "30s_female" => Ok(ClientType::ThirtiesFemale),
            "40s_male" => Ok(ClientType::FortiesMale),
            "40s_female" => Ok(ClientType::FortiesFemale),
            other => Err(UnknownOptionError::new("client type", other)),
        }
    }
}

/// Atmosphere level, ordered calm to lively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mood {
    Calm,
    SlightlyCalm,
    Neutral,
    SlightlyLively,
    Lively,
}

impl Mood {
    pub fn as_key(&self) -> &'static str {
        match self {
            Mood::Calm => "calm",
            Mood::SlightlyCalm => "slightly_calm",
            Mood::Neutral => "neutral",
            Mood::SlightlyLively => "slightly_lively",
            Mood::Lively => "lively",
        }
    }

    pub fn profile(&self) -> &'static brand::MoodProfile {
        brand::lookup_mood(self.as_key())
    }
}

impl FromStr for Mood {
    type Err = UnknownOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "calm" => Ok(Mood::Calm),
            "slightly_calm" => Ok(Mood::SlightlyCalm),
            "neutral" => Ok(Mood::Neutral),
            "slightly_lively" => Ok(Mood::SlightlyLively),
            "lively" => Ok(Mood::Lively),
            other => Err(UnknownOptionError::new("mood", other)),
        }
    }
}

/// One of the seven supported output aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Square,
    Portrait4x5,
    Wide16x9,
    Story9x16,
    Classic4x3,
    Photo3x2,
    Ultrawide21x9,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait4x5 => "4:5",
            AspectRatio::Wide16x9 => "16:9",
            AspectRatio::Story9x16 => "9:16",
            AspectRatio::Classic4x3 => "4:3",
            AspectRatio::Photo3x2 => "3:2",
            AspectRatio::Ultrawide21x9 => "21:9",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1:1" => Ok(AspectRatio::Square),
            "4:5" => Ok(AspectRatio::Portrait4x5),
            "16:9" => Ok(AspectRatio::Wide16x9),
            "9:16" => Ok(AspectRatio::Story9x16),
            "4:3" => Ok(AspectRatio::Classic4x3),
            "3:2" => Ok(AspectRatio::Photo3x2),
            "21:9" => Ok(AspectRatio::Ultrawide21x9),
            other => Err(UnknownOptionError::new("aspect ratio", other)),
        }
    }
}

/// Glasses override for the designated staff member. `None` on the request
/// means the reference images decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlassesPreference {
    WithGlasses,
    WithoutGlasses,
}

impl FromStr for GlassesPreference {
    type Err = UnknownOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "with" | "with_glasses" => Ok(GlassesPreference::WithGlasses),
            "without" | "without_glasses" => Ok(GlassesPreference::WithoutGlasses),
            other => Err(UnknownOptionError::new("glasses preference", other)),
        }
    }
}

/// Role a reference image plays in generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Background,
    Staff,
}

/// One input photograph anchoring appearance or setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub path: PathBuf,
    pub kind: ReferenceKind,
    pub label: String,
}

/// A key outside one of the fixed option sets. Recovered at the edges (CLI
/// usage message, brand-table defaults); the composer never sees one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {field}: '{value}'")]
pub struct UnknownOptionError {
    pub field: &'static str,
    pub value: String,
}

impl UnknownOptionError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Caller-side precondition violation; never recovered silently.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvalidRequestError {
    #[error("client_count must be 0 when no client type is selected, got {0}")]
    CountWithoutClient(u8),
    #[error("client_count must be at least 1 when a client type is selected")]
    ClientWithoutCount,
    #[error("client_count must be at most {max}, got {got}")]
    CountTooLarge { got: u8, max: u8 },
    #[error("glasses preference is only supported for staff member '{expected}', got '{got}'")]
    GlassesNotApplicable { got: String, expected: &'static str },
    #[error("use_background is set but no background reference image was supplied")]
    MissingBackgroundReference,
    #[error("a background reference image was supplied but use_background is not set")]
    UnexpectedBackgroundReference,
}

pub const MAX_CLIENT_COUNT: u8 = 4;

/// Everything the composer needs for one generation action. Built once by the
/// front end; the composer never re-derives defaults.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub purpose: Purpose,
    pub location: Option<String>,
    pub use_background: bool,
    pub situation: Situation,
    pub staff: Option<String>,
    pub staff_glasses: Option<GlassesPreference>,
    pub client_type: Option<ClientType>,
    pub client_count: u8,
    pub aspect_ratio: AspectRatio,
    pub mood: Mood,
    pub additional_text: String,
    pub image_text: Option<String>,
    pub reference_images: Vec<ReferenceImage>,
}

impl GenerationRequest {
    pub fn staff_references(&self) -> Vec<&ReferenceImage> {
        self.reference_images
            .iter()
            .filter(|image| image.kind == ReferenceKind::Staff)
            .collect()
    }

    pub fn background_reference(&self) -> Option<&ReferenceImage> {
        self.reference_images
            .iter()
            .find(|image| image.kind == ReferenceKind::Background)
    }

    /// Checks the cross-field invariants. A failure here is a front-end bug,
    /// not a user input problem.
    pub fn validate(&self) -> Result<(), InvalidRequestError> {
        match (self.client_type, self.client_count) {
            (None, count) if count > 0 => {
                return Err(InvalidRequestError::CountWithoutClient(count));
            }
            (Some(_), 0) => return Err(InvalidRequestError::ClientWithoutCount),
            (_, count) if count > MAX_CLIENT_COUNT => {
                return Err(InvalidRequestError::CountTooLarge {
                    got: count,
                    max: MAX_CLIENT_COUNT,
                });
            }
            _ => {}
        }

        if self.staff_glasses.is_some() {
            match self.staff.as_deref() {
                Some(brand::GLASSES_STAFF_ID) => {}
                other => {
                    return Err(InvalidRequestError::GlassesNotApplicable {
                        got: other.unwrap_or("<none>").to_string(),
                        expected: brand::GLASSES_STAFF_ID,
                    });
                }
            }
        }

        let has_background = self.background_reference().is_some();
        if self.use_background && !has_background {
            return Err(InvalidRequestError::MissingBackgroundReference);
        }
        if !self.use_background && has_background {
            return Err(InvalidRequestError::UnexpectedBackgroundReference);
        }

        Ok(())
    }
}

impl fmt::Display for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "purpose={} situation={} staff={} client={} count={} mood={} aspect={} background={}",
            self.purpose.as_key(),
            self.situation.as_key(),
            self.staff.as_deref().unwrap_or("-"),
            self.client_type.map(|c| c.as_key()).unwrap_or("-"),
            self.client_count,
            self.mood.as_key(),
            self.aspect_ratio.as_str(),
            self.use_background,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> GenerationRequest {
        GenerationRequest {
            purpose: Purpose::Instagram,
            location: Some("cyclez".to_string()),
            use_background: false,
            situation: Situation::TestRideConsultation,
            staff: None,
            staff_glasses: None,
            client_type: None,
            client_count: 0,
            aspect_ratio: AspectRatio::Wide16x9,
            mood: Mood::Neutral,
            additional_text: String::new(),
            image_text: None,
            reference_images: Vec::new(),
        }
    }

    fn background_ref() -> ReferenceImage {
        ReferenceImage {
            path: PathBuf::from("assets/backgrounds/cyclez/front.jpg"),
            kind: ReferenceKind::Background,
            label: "cyclez shop background".to_string(),
        }
    }

    #[test]
    fn baseline_request_is_valid() {
        assert!(baseline().validate().is_ok());
    }

    #[test]
    fn count_without_client_is_rejected() {
        let mut request = baseline();
        request.client_count = 2;
        assert!(matches!(
            request.validate(),
            Err(InvalidRequestError::CountWithoutClient(2))
        ));
    }

    #[test]
    fn client_without_count_is_rejected() {
        let mut request = baseline();
        request.client_type = Some(ClientType::ThirtiesMale);
        assert!(matches!(
            request.validate(),
            Err(InvalidRequestError::ClientWithoutCount)
        ));
    }

    #[test]
    fn count_above_max_is_rejected() {
        let mut request = baseline();
        request.client_type = Some(ClientType::ThirtiesMale);
        request.client_count = 5;
        assert!(matches!(
            request.validate(),
            Err(InvalidRequestError::CountTooLarge { got: 5, max: 4 })
        ));
    }

    #[test]
    fn glasses_require_designated_staff() {
        let mut request = baseline();
        request.staff = Some("senda".to_string());
        request.staff_glasses = Some(GlassesPreference::WithGlasses);
        assert!(matches!(
            request.validate(),
            Err(InvalidRequestError::GlassesNotApplicable { .. })
        ));

        request.staff = Some("okada".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn background_flag_and_reference_must_agree() {
        let mut request = baseline();
        request.use_background = true;
        assert!(matches!(
            request.validate(),
            Err(InvalidRequestError::MissingBackgroundReference)
        ));

        request.reference_images.push(background_ref());
        assert!(request.validate().is_ok());

        request.use_background = false;
        assert!(matches!(
            request.validate(),
            Err(InvalidRequestError::UnexpectedBackgroundReference)
        ));
    }

    #[test]
    fn option_keys_round_trip() {
        for key in [
            "bike_fitting",
            "test_ride_consultation",
            "maintenance_explanation",
            "parts_accessories",
            "beginner_consultation",
            "commuter_bike",
            "long_ride",
            "apparel_consultation",
            "interior",
            "bike_display",
        ] {
            assert_eq!(key.parse::<Situation>().unwrap().as_key(), key);
        }
        for key in ["1:1", "4:5", "16:9", "9:16", "4:3", "3:2", "21:9"] {
            assert_eq!(key.parse::<AspectRatio>().unwrap().as_str(), key);
        }
        assert!("__nope__".parse::<Mood>().is_err());
    }
}
