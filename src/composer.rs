//! Prompt composition: turns a [`GenerationRequest`] into the single English
//! instruction string submitted to the image model.
//!
//! Two paths with an identical output contract. The primary path builds a
//! structured brief and delegates wording to the Anthropic text model; the
//! fallback path fills a fixed sentence template locally and never touches the
//! network. The caller picks the fallback explicitly when the primary path
//! fails; nothing here degrades silently.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::brand;
use crate::llm::claude;
use crate::request::{GenerationRequest, GlassesPreference, InvalidRequestError};

/// Must open every prompt; the image model is told to keep it verbatim.
pub const NATIONALITY_CLAUSE: &str = "All people in this image must be Japanese.";

#[derive(Debug, thiserror::Error)]
pub enum PromptGenerationError {
    #[error(transparent)]
    Invalid(#[from] InvalidRequestError),
    #[error("prompt generation timed out after {0}s")]
    Timeout(u64),
    #[error("prompt generation failed: {0}")]
    Api(anyhow::Error),
    #[error("generated prompt contains forbidden brand '{brand}'")]
    PolicyViolation { brand: &'static str },
}

/// Brand names that double as everyday English words. Scanning these
/// case-insensitively would reject harmless prose ("a giant window",
/// "specialized staff"), so only the capitalized brand spellings count.
const AMBIGUOUS_BRAND_TOKENS: &[&str] = &["Specialized", "Trek", "GIANT", "ANCHOR"];

fn brand_title_case(brand: &str) -> String {
    let mut chars = brand.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

static FORBIDDEN_BRAND_SCANNERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    brand::FORBIDDEN_BIKE_BRANDS
        .iter()
        .chain(brand::FORBIDDEN_APPAREL_BRANDS.iter())
        .map(|brand| {
            let pattern = if AMBIGUOUS_BRAND_TOKENS.contains(brand) {
                format!(
                    r"\b(?:{}|{})\b",
                    regex::escape(&brand_title_case(brand)),
                    regex::escape(&brand.to_uppercase())
                )
            } else {
                format!(r"(?i)\b{}\b", regex::escape(brand))
            };
            let scanner = Regex::new(&pattern).expect("static brand pattern must compile");
            (*brand, scanner)
        })
        .collect()
});

/// Rejects a prompt that names any forbidden brand. Applied to externally
/// generated prompts before they are accepted; the local template path cannot
/// emit these tokens in the first place.
pub fn enforce_brand_policy(prompt: &str) -> Result<(), PromptGenerationError> {
    for (brand, scanner) in FORBIDDEN_BRAND_SCANNERS.iter() {
        if scanner.is_match(prompt) {
            warn!("Rejecting generated prompt: forbidden brand '{brand}' present");
            return Err(PromptGenerationError::PolicyViolation { brand });
        }
    }
    Ok(())
}

fn section(title: &str, body: &str) -> String {
    format!("{title}\n{body}\n")
}

/// System instructions for the text model: the full brand guidelines plus the
/// non-negotiable rules and the expected output shape.
pub fn build_system_instructions() -> String {
    format!(
        "You are an expert at writing prompts for a generative image model.\n\
         You write prompts that produce marketing images for cycleZ, a sports-bicycle shop.\n\n\
         {guidelines}\n\
         ## Your task\n\
         1. Understand the structured brief you are given.\n\
         2. Produce an English prompt that fully complies with the brand guidelines.\n\
         3. Never use a forbidden brand or a forbidden keyword.\n\
         4. Draw actively from the preferred brands and keywords ({keywords}).\n\
         5. Include concrete, visual descriptions.\n\
         6. IMPORTANT: every person in the image is Japanese. Open the prompt with \
         \"{nationality}\" and keep that requirement intact, verbatim or in equivalent phrasing.\n\
         7. IMPORTANT: when bicycles appear, pick from the preferred bicycle brands \
         ({bikes}).\n\
         8. IMPORTANT: when apparel appears, pick from the preferred apparel brands \
         ({apparel}).\n\n\
         ## Output format\n\
         Output only the English prompt as a single paragraph, with no explanation or notes.\n\
         Cover: scene setting (place, environment); people (if any); action and pose; \
         light and atmosphere; camera angle and composition; style (photographic, illustration, ...).\n",
        guidelines = brand::BRAND_GUIDELINES,
        keywords = brand::PREFERRED_KEYWORDS.join(", "),
        nationality = NATIONALITY_CLAUSE,
        bikes = brand::PREFERRED_BIKE_BRANDS.join(", "),
        apparel = brand::PREFERRED_APPAREL_BRANDS.join(", "),
    )
}

/// The per-request brief handed to the text model. Pure function of the
/// request; unit-tested without a network.
pub fn build_user_brief(request: &GenerationRequest) -> String {
    let situation = request.situation.profile();
    let mood = request.mood.profile();
    let staff_references = request.staff_references();

    let mut sections: Vec<String> = Vec::new();
    sections.push(
        "Create an image-generation prompt for the following request.".to_string(),
    );
    sections.push(format!("Intended use: {}.", request.purpose.label()));

    let store_line = match (&request.location, request.use_background) {
        (Some(location), true) => format!(
            "[Store] {location} (use the supplied background reference image as the setting)"
        ),
        (Some(location), false) => format!(
            "[Store] {location} (no background reference: place the scene on a plain, \
             neutral background and do not use any reference image as the setting)"
        ),
        (None, true) => "[Store] use the supplied background reference image as the setting"
            .to_string(),
        (None, false) => "[Store] plain, neutral background; do not use any reference image \
             as the setting"
            .to_string(),
    };
    sections.push(store_line);

    sections.push(format!(
        "[Situation] {}\n- Scene: {}\n- Action: {}\n- Base mood: {}",
        request.situation.as_key(),
        situation.scene,
        situation.action,
        situation.mood
    ));

    let mut people_lines: Vec<String> = Vec::new();
    if let Some(staff) = &request.staff {
        if staff_references.len() > 1 {
            people_lines.push(format!(
                "- Staff: {staff}. Keep this staff member's visual identity. {count} reference \
                 images are supplied; reconcile face, hairstyle, build, and skin tone across \
                 all of them instead of trusting any single image.",
                count = staff_references.len()
            ));
        } else {
            people_lines.push(format!(
                "- Staff: {staff}. Keep this staff member's visual identity exactly as in the \
                 supplied reference image."
            ));
        }
        match request.staff_glasses {
            Some(GlassesPreference::WithGlasses) => people_lines.push(
                "- The staff member must wear glasses, even if the reference images show them \
                 without."
                    .to_string(),
            ),
            Some(GlassesPreference::WithoutGlasses) => people_lines.push(
                "- The staff member must not wear glasses, even if the reference images show \
                 them with."
                    .to_string(),
            ),
            None => {}
        }
    }
    if let Some(client) = request.client_type {
        let description = client.description();
        if request.client_count <= 1 {
            people_lines.push(format!("- Customer: {description} (1 person)."));
        } else {
            people_lines.push(format!(
                "- Customers: {description}, {count} people appearing together as one group of \
                 the same type, not {count} unrelated individuals.",
                count = request.client_count
            ));
        }
    }
    if people_lines.is_empty() {
        people_lines.push("- No people (shop and bikes only).".to_string());
    }
    sections.push(section("[People]", &people_lines.join("\n")));

    sections.push(format!(
        "[Atmosphere] {}\n- {}",
        request.mood.as_key(),
        mood.description
    ));

    let additional = request.additional_text.trim();
    sections.push(section(
        "[Additional instructions]",
        if additional.is_empty() {
            "None."
        } else {
            additional
        },
    ));
    if !additional.is_empty() {
        sections.push(
            "Treat the additional instructions as a user override to respect, but they must \
             not reintroduce any forbidden brand or keyword."
                .to_string(),
        );
    }

    if let Some(text) = request
        .image_text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        sections.push(format!(
            "[In-image text]\nRender the literal text \"{text}\" inside the generated image."
        ));
    }

    sections.push(format!(
        "[Hard constraints - restated because negative constraints are easy to drop]\n\
         1. Where reference images are supplied, the prompt must say to use them: \
         \"use this background\" for the background image, \"keep this staff member's \
         appearance\" for staff images.\n\
         2. The scene must read like a Japanese bicycle shop.\n\
         3. Emphasize natural light, cleanliness, and approachability.\n\
         4. Never mention these bicycle brands: {bikes}.\n\
         5. Never mention these apparel brands: {apparel}.\n\
         6. Avoid these words entirely: {keywords}.",
        bikes = brand::FORBIDDEN_BIKE_BRANDS.join(", "),
        apparel = brand::FORBIDDEN_APPAREL_BRANDS.join(", "),
        keywords = brand::FORBIDDEN_KEYWORDS.join(", "),
    ));

    sections.join("\n\n")
}

/// Primary path: delegate wording to the text model, then gate the result on
/// the brand policy. Failures propagate; choosing [`compose_locally`] as a
/// fallback is the caller's decision.
pub async fn compose_via_model(
    request: &GenerationRequest,
) -> Result<String, PromptGenerationError> {
    request.validate()?;

    let system = build_system_instructions();
    let brief = build_user_brief(request);
    debug!(target: "studio.composer", request = %request, "Requesting prompt from text model");

    let prompt = claude::generate(&system, &brief).await?;
    let prompt = prompt.trim().to_string();
    enforce_brand_policy(&prompt)?;
    Ok(prompt)
}

/// Fallback path: deterministic template filling. Cruder wording than the
/// model path but preserves every hard constraint, so downstream output never
/// violates brand policy even in degraded mode.
pub fn compose_locally(request: &GenerationRequest) -> Result<String, InvalidRequestError> {
    request.validate()?;

    let situation = request.situation.profile();
    let mood = request.mood.profile();
    let staff_reference_count = request.staff_references().len();

    let mut parts: Vec<String> = Vec::new();

    parts.push(NATIONALITY_CLAUSE.to_string());
    parts.push(format!("A professional photograph of {}.", situation.scene));

    if request.staff.is_some() {
        if staff_reference_count > 1 {
            parts.push(format!(
                "The staff member from the reference images is present; reconcile their face, \
                 hairstyle, build, and skin tone across all {staff_reference_count} reference \
                 images rather than copying a single one."
            ));
        } else {
            parts.push(
                "The staff member from the reference image is present, maintaining their exact \
                 appearance."
                    .to_string(),
            );
        }
        match request.staff_glasses {
            Some(GlassesPreference::WithGlasses) => parts.push(
                "The staff member must wear glasses, regardless of the reference images."
                    .to_string(),
            ),
            Some(GlassesPreference::WithoutGlasses) => parts.push(
                "The staff member must not wear glasses, regardless of the reference images."
                    .to_string(),
            ),
            None => {}
        }
    }

    if let Some(client) = request.client_type {
        let description = client.description();
        if request.client_count <= 1 {
            parts.push(format!("A customer: {description}."));
        } else {
            parts.push(format!(
                "{count} customers: {description} (one group of {count} people of similar type, \
                 together in the scene).",
                count = request.client_count
            ));
        }
    }

    parts.push(format!("Scene: {}.", situation.action));
    parts.push(format!("Atmosphere: {}.", mood.description));
    parts.push(format!("{}.", situation.mood));

    parts.push(
        "If bicycles are visible, they should be from brands like GIOS, BASSO, SCOTT, DEROSA, \
         or WILIER."
            .to_string(),
    );
    parts.push(
        "Style: natural lighting, clean modern bicycle shop interior, welcoming atmosphere, \
         high quality photography, lifestyle-focused, casual cycling vibe."
            .to_string(),
    );

    if request.use_background {
        parts.push("Use the provided background image as the setting.".to_string());
    } else {
        parts.push(
            "Place the scene on a plain, neutral background; do not use any reference image \
             as the setting."
                .to_string(),
        );
    }

    Ok(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::request::{
        AspectRatio, ClientType, GenerationRequest, Mood, Purpose, ReferenceImage, ReferenceKind,
        Situation,
    };

    fn request() -> GenerationRequest {
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

    fn background_reference() -> ReferenceImage {
        ReferenceImage {
            path: PathBuf::from("assets/backgrounds/cyclez/showroom.jpg"),
            kind: ReferenceKind::Background,
            label: "cyclez showroom".to_string(),
        }
    }

    fn staff_reference(name: &str) -> ReferenceImage {
        ReferenceImage {
            path: PathBuf::from(format!("assets/staff/okada/{name}")),
            kind: ReferenceKind::Staff,
            label: "staff okada".to_string(),
        }
    }

    #[test]
    fn local_prompt_opens_with_nationality_clause() {
        let prompt = compose_locally(&request()).unwrap();
        assert!(prompt.starts_with(NATIONALITY_CLAUSE));
    }

    #[test]
    fn local_prompt_never_names_forbidden_brands() {
        let mut requests = vec![request()];
        let mut staffed = request();
        staffed.staff = Some("okada".to_string());
        staffed.client_type = Some(ClientType::Early20sMaleStudent);
        staffed.client_count = 3;
        staffed.use_background = true;
        staffed.reference_images = vec![background_reference(), staff_reference("a.jpg")];
        requests.push(staffed);

        for request in &requests {
            let prompt = compose_locally(request).unwrap();
            assert!(enforce_brand_policy(&prompt).is_ok(), "prompt: {prompt}");
        }
    }

    #[test]
    fn no_client_means_no_persona_fragment() {
        let prompt = compose_locally(&request()).unwrap();
        assert!(!prompt.contains("A customer:"));
        assert!(!prompt.contains("customers:"));
        assert!(!prompt.contains("university student"));
    }

    #[test]
    fn group_counts_are_stated_as_one_group() {
        let mut request = request();
        request.client_type = Some(ClientType::FiftiesFemale);
        request.client_count = 3;
        let prompt = compose_locally(&request).unwrap();
        assert!(prompt.contains("3 customers:"));
        assert!(prompt.contains("one group of 3 people of similar type"));
        assert_eq!(prompt.matches("customers:").count(), 1);
    }

    #[test]
    fn single_customer_uses_singular_sentence() {
        let mut request = request();
        request.client_type = Some(ClientType::ThirtiesFemale);
        request.client_count = 1;
        let prompt = compose_locally(&request).unwrap();
        assert!(prompt.contains("A customer: a Japanese woman in her 30s"));
        assert!(!prompt.contains("group of"));
    }

    #[test]
    fn background_branch_controls_reference_usage() {
        let plain = compose_locally(&request()).unwrap();
        assert!(plain.contains("plain, neutral background"));
        assert!(!plain.contains("Use the provided background image"));

        let mut with_background = request();
        with_background.use_background = true;
        with_background.reference_images.push(background_reference());
        let referenced = compose_locally(&with_background).unwrap();
        assert!(referenced.contains("Use the provided background image as the setting."));
        assert!(!referenced.contains("plain, neutral background"));
    }

    #[test]
    fn glasses_tristate_controls_glasses_clauses() {
        let mut request = request();
        request.staff = Some("okada".to_string());

        let unspecified = compose_locally(&request).unwrap();
        assert!(!unspecified.contains("glasses"));

        request.staff_glasses = Some(GlassesPreference::WithGlasses);
        let with = compose_locally(&request).unwrap();
        assert!(with.contains("must wear glasses"));
        assert!(!with.contains("must not wear glasses"));

        request.staff_glasses = Some(GlassesPreference::WithoutGlasses);
        let without = compose_locally(&request).unwrap();
        assert!(without.contains("must not wear glasses"));
    }

    #[test]
    fn multiple_staff_references_ask_for_reconciliation() {
        let mut request = request();
        request.staff = Some("okada".to_string());
        request.reference_images =
            vec![staff_reference("a.jpg"), staff_reference("b.jpg")];
        let prompt = compose_locally(&request).unwrap();
        assert!(prompt.contains("across all 2 reference images"));
        assert!(prompt.contains("face, hairstyle, build, and skin tone"));
    }

    #[test]
    fn compose_locally_is_idempotent() {
        let mut request = request();
        request.staff = Some("senda".to_string());
        request.client_type = Some(ClientType::FortiesMale);
        request.client_count = 2;
        assert_eq!(
            compose_locally(&request).unwrap(),
            compose_locally(&request).unwrap()
        );
    }

    #[test]
    fn okada_test_ride_scenario() {
        let mut request = request();
        request.situation = Situation::TestRideConsultation;
        request.staff = Some("okada".to_string());
        request.use_background = true;
        request.reference_images = vec![background_reference(), staff_reference("a.jpg")];

        let prompt = compose_locally(&request).unwrap();
        assert!(prompt.starts_with(NATIONALITY_CLAUSE));
        assert!(prompt.contains("maintaining their exact appearance"));
        assert!(!prompt.contains("A customer:"));
        assert!(prompt.contains("Use the provided background image as the setting."));
    }

    #[test]
    fn empty_interior_scenario() {
        let mut request = request();
        request.situation = Situation::Interior;
        let prompt = compose_locally(&request).unwrap();
        assert!(!prompt.contains("staff member"));
        assert!(!prompt.contains("A customer:"));
        assert!(prompt.contains("plain, neutral background"));
        assert!(prompt.contains("clean, modern bicycle shop interior"));
    }

    #[test]
    fn invalid_request_is_surfaced_not_recovered() {
        let mut request = request();
        request.client_count = 2;
        assert!(compose_locally(&request).is_err());
    }

    #[test]
    fn brief_restates_forbidden_lists() {
        let brief = build_user_brief(&request());
        assert!(brief.contains("Never mention these bicycle brands:"));
        assert!(brief.contains("Specialized"));
        assert!(brief.contains("Rapha"));
        assert!(brief.contains("Avoid these words entirely:"));
        assert!(brief.contains("peloton"));
    }

    #[test]
    fn brief_mentions_group_semantics_and_glasses_override() {
        let mut request = request();
        request.staff = Some("okada".to_string());
        request.staff_glasses = Some(GlassesPreference::WithoutGlasses);
        request.client_type = Some(ClientType::Early20sFemaleStudent);
        request.client_count = 2;
        let brief = build_user_brief(&request);
        assert!(brief.contains("one group of the same type"));
        assert!(brief.contains("must not wear glasses"));
    }

    #[test]
    fn brief_without_people_says_so() {
        let brief = build_user_brief(&request());
        assert!(brief.contains("No people (shop and bikes only)."));
    }

    #[test]
    fn brief_carries_image_text_verbatim() {
        let mut request = request();
        request.image_text = Some("Test rides welcome".to_string());
        let brief = build_user_brief(&request);
        assert!(brief.contains("Render the literal text \"Test rides welcome\""));
    }

    #[test]
    fn system_instructions_embed_guidelines_and_nationality_rule() {
        let system = build_system_instructions();
        assert!(system.contains("cycleZ brand guidelines"));
        assert!(system.contains(NATIONALITY_CLAUSE));
        assert!(system.contains("GIOS"));
        assert!(system.contains("STEMDESIGN"));
    }

    #[test]
    fn brand_scan_rejects_forbidden_tokens() {
        assert!(enforce_brand_policy("a rider on a PINARELLO frame").is_err());
        assert!(enforce_brand_policy("wearing a rapha jersey").is_err());
        assert!(enforce_brand_policy("a Trek bicycle in the corner").is_err());
        assert!(matches!(
            enforce_brand_policy("a Pearl Izumi jacket"),
            Err(PromptGenerationError::PolicyViolation { brand: "Pearl Izumi" })
        ));
    }

    #[test]
    fn brand_scan_allows_everyday_words_and_preferred_brands() {
        assert!(enforce_brand_policy("a giant window floods the shop with light").is_ok());
        assert!(enforce_brand_policy("staff with specialized fitting knowledge").is_ok());
        assert!(enforce_brand_policy("a long trek through the city").is_ok());
        assert!(enforce_brand_policy("a GIOS road bike next to a TOKYOBIKE").is_ok());
    }
}
