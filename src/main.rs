use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use tracing::{info, warn};

mod assets;
mod brand;
mod composer;
mod config;
mod llm;
mod request;
mod utils;

use composer::{compose_locally, compose_via_model};
use config::CONFIG;
use llm::{generate_image, GeminiImageConfig};
use request::{
    AspectRatio, ClientType, GenerationRequest, GlassesPreference, Mood, Purpose, ReferenceImage,
    ReferenceKind, Situation,
};
use utils::logging::init_logging;

fn usage() -> &'static str {
    "Usage: cyclez_studio [OPTIONS]\n\
     \n\
     Options:\n\
     \x20 --situation <key>          scenario (default: test_ride_consultation)\n\
     \x20 --purpose <key>            promotional_staff|instagram|shop_interior|product|custom\n\
     \x20 --location <id>            store id for the background (default from DEFAULT_LOCATION)\n\
     \x20 --no-background            plain neutral background instead of a store reference\n\
     \x20 --background-image <path>  explicit background reference image\n\
     \x20 --staff <id>               staff member to include (okada|senda|nishii)\n\
     \x20 --staff-image <path>       explicit staff reference image (repeatable)\n\
     \x20 --glasses <with|without>   glasses override (staff 'okada' only)\n\
     \x20 --client <key>             customer persona key\n\
     \x20 --count <n>                number of customers, 1-4 (default 1 when --client is set)\n\
     \x20 --mood <key>               calm|slightly_calm|neutral|slightly_lively|lively\n\
     \x20 --aspect <ratio>           1:1|4:5|16:9|9:16|4:3|3:2|21:9 (default: 1:1)\n\
     \x20 --size <tier>              output size tier passed to the image model (e.g. 2K)\n\
     \x20 --text <text>              free-form additional instructions\n\
     \x20 --image-text <text>        literal text to render inside the image\n\
     \x20 --local-only               skip the text model, use the local template\n\
     \x20 --dry-run                  print the composed prompt and exit\n\
     \x20 --help                     show this message"
}

#[derive(Debug, Default)]
struct CliOptions {
    situation: Option<String>,
    purpose: Option<String>,
    location: Option<String>,
    no_background: bool,
    background_image: Option<PathBuf>,
    staff: Option<String>,
    staff_images: Vec<PathBuf>,
    glasses: Option<String>,
    client: Option<String>,
    count: Option<u8>,
    mood: Option<String>,
    aspect: Option<String>,
    size: Option<String>,
    text: Option<String>,
    image_text: Option<String>,
    local_only: bool,
    dry_run: bool,
}

fn parse_args(args: &[String]) -> Result<Option<CliOptions>> {
    let mut options = CliOptions::default();

    let mut index = 1;
    while index < args.len() {
        let flag = args[index].as_str();
        let take_value = |index: &mut usize| -> Result<String> {
            *index += 1;
            args.get(*index)
                .cloned()
                .ok_or_else(|| anyhow!("Missing value for {flag}"))
        };

        match flag {
            "--situation" => options.situation = Some(take_value(&mut index)?),
            "--purpose" => options.purpose = Some(take_value(&mut index)?),
            "--location" => options.location = Some(take_value(&mut index)?),
            "--no-background" => options.no_background = true,
            "--background-image" => {
                options.background_image = Some(PathBuf::from(take_value(&mut index)?));
            }
            "--staff" => options.staff = Some(take_value(&mut index)?),
            "--staff-image" => {
                options.staff_images.push(PathBuf::from(take_value(&mut index)?));
            }
            "--glasses" => options.glasses = Some(take_value(&mut index)?),
            "--client" => options.client = Some(take_value(&mut index)?),
            "--count" => {
                let value = take_value(&mut index)?;
                options.count = Some(
                    value
                        .parse::<u8>()
                        .map_err(|_| anyhow!("Invalid --count value: {value}"))?,
                );
            }
            "--mood" => options.mood = Some(take_value(&mut index)?),
            "--aspect" => options.aspect = Some(take_value(&mut index)?),
            "--size" => options.size = Some(take_value(&mut index)?),
            "--text" => options.text = Some(take_value(&mut index)?),
            "--image-text" => options.image_text = Some(take_value(&mut index)?),
            "--local-only" => options.local_only = true,
            "--dry-run" => options.dry_run = true,
            "--help" | "-h" => return Ok(None),
            other => {
                return Err(anyhow!("Unknown argument: {other}\n{}", usage()));
            }
        }
        index += 1;
    }

    Ok(Some(options))
}

fn collect_reference_images(
    options: &CliOptions,
    use_background: bool,
    location: &str,
) -> Result<Vec<ReferenceImage>> {
    let mut references = Vec::new();

    if use_background {
        let path = match &options.background_image {
            Some(path) => path.clone(),
            None => {
                let dir = assets::backgrounds_dir(location);
                assets::list_reference_images(&dir)
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        anyhow!(
                            "No background image found in {} (pass --background-image or \
                             --no-background)",
                            dir.display()
                        )
                    })?
            }
        };
        references.push(ReferenceImage {
            path,
            kind: ReferenceKind::Background,
            label: format!("{location} store background"),
        });
    }

    if let Some(staff) = &options.staff {
        let paths = if options.staff_images.is_empty() {
            let dir = assets::staff_dir(staff);
            let found = assets::list_reference_images(&dir);
            if found.is_empty() {
                return Err(anyhow!(
                    "No reference images found for staff '{}' in {}",
                    staff,
                    dir.display()
                ));
            }
            found
        } else {
            options.staff_images.clone()
        };
        for path in paths {
            references.push(ReferenceImage {
                path,
                kind: ReferenceKind::Staff,
                label: format!("staff {staff}"),
            });
        }
    }

    Ok(references)
}

fn build_request(options: &CliOptions) -> Result<GenerationRequest> {
    let situation = options
        .situation
        .as_deref()
        .unwrap_or(brand::DEFAULT_SITUATION_KEY)
        .parse::<Situation>()?;
    let purpose = options
        .purpose
        .as_deref()
        .unwrap_or("custom")
        .parse::<Purpose>()?;
    let mood = options
        .mood
        .as_deref()
        .unwrap_or(brand::DEFAULT_MOOD_KEY)
        .parse::<Mood>()?;
    let aspect_ratio = options
        .aspect
        .as_deref()
        .unwrap_or("1:1")
        .parse::<AspectRatio>()?;
    let client_type = options
        .client
        .as_deref()
        .map(|value| value.parse::<ClientType>())
        .transpose()?;
    let staff_glasses = options
        .glasses
        .as_deref()
        .map(|value| value.parse::<GlassesPreference>())
        .transpose()?;
    let client_count = options
        .count
        .unwrap_or(if client_type.is_some() { 1 } else { 0 });

    let use_background = !options.no_background;
    let location = options
        .location
        .clone()
        .unwrap_or_else(|| CONFIG.default_location.clone());
    let reference_images = collect_reference_images(options, use_background, &location)?;

    let request = GenerationRequest {
        purpose,
        location: use_background.then_some(location),
        use_background,
        situation,
        staff: options.staff.clone(),
        staff_glasses,
        client_type,
        client_count,
        aspect_ratio,
        mood,
        additional_text: options.text.clone().unwrap_or_default(),
        image_text: options.image_text.clone(),
        reference_images,
    };
    request.validate()?;
    Ok(request)
}

async fn compose_prompt(request: &GenerationRequest, local_only: bool) -> Result<String> {
    if local_only {
        return Ok(compose_locally(request)?);
    }

    match compose_via_model(request).await {
        Ok(prompt) => Ok(prompt),
        Err(err) => {
            warn!("Prompt generation failed ({err}); falling back to the local template.");
            Ok(compose_locally(request)?)
        }
    }
}

async fn run(options: CliOptions) -> Result<()> {
    let request = build_request(&options)?;
    info!("Generation request: {request}");

    let prompt = compose_prompt(&request, options.local_only).await?;
    info!("Composed prompt: {prompt}");

    if options.dry_run {
        println!("{prompt}");
        return Ok(());
    }

    let references =
        assets::load_references(&request.reference_images).context("Loading reference images")?;
    let image_config = GeminiImageConfig {
        aspect_ratio: Some(request.aspect_ratio.as_str().to_string()),
        image_size: options.size.clone(),
    };

    let generated = generate_image(&prompt, &references, &image_config).await?;
    let path = assets::save_output(&generated.bytes)?;

    println!("Saved generated image to {}", path.display());
    if let Some(note) = generated.text_note {
        println!("Model note: {note}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args)? else {
        println!("{}", usage());
        return Ok(());
    };

    run(options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("cyclez_studio".to_string())
            .chain(values.iter().map(|value| value.to_string()))
            .collect()
    }

    #[test]
    fn parses_a_full_flag_set() {
        let options = parse_args(&args(&[
            "--situation",
            "bike_fitting",
            "--staff",
            "okada",
            "--glasses",
            "with",
            "--client",
            "30s_male",
            "--count",
            "2",
            "--mood",
            "lively",
            "--aspect",
            "16:9",
            "--no-background",
            "--dry-run",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(options.situation.as_deref(), Some("bike_fitting"));
        assert_eq!(options.staff.as_deref(), Some("okada"));
        assert_eq!(options.count, Some(2));
        assert!(options.no_background);
        assert!(options.dry_run);
    }

    #[test]
    fn staff_image_flag_is_repeatable() {
        let options = parse_args(&args(&[
            "--staff",
            "okada",
            "--staff-image",
            "a.jpg",
            "--staff-image",
            "b.jpg",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(options.staff_images.len(), 2);
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse_args(&args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn unknown_flags_and_missing_values_are_rejected() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--situation"])).is_err());
        assert!(parse_args(&args(&["--count", "many"])).is_err());
    }

    #[test]
    fn local_request_defaults_are_applied() {
        let mut options = parse_args(&args(&["--no-background"])).unwrap().unwrap();
        options.local_only = true;
        let request = build_request(&options).unwrap();
        assert_eq!(request.situation, Situation::TestRideConsultation);
        assert_eq!(request.mood, Mood::Neutral);
        assert_eq!(request.aspect_ratio, AspectRatio::Square);
        assert_eq!(request.client_count, 0);
        assert!(!request.use_background);
        assert!(request.reference_images.is_empty());
    }

    #[test]
    fn count_defaults_to_one_with_a_client() {
        let options = parse_args(&args(&["--no-background", "--client", "50s_male"]))
            .unwrap()
            .unwrap();
        let request = build_request(&options).unwrap();
        assert_eq!(request.client_count, 1);
    }
}
