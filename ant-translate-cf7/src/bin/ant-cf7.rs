use ant_translate_cf7::{
    Collaborators, Hook, HostRequest, HtmlTranslator, MockMode, MockTranslator, PlainTranslator,
    RequestPipeline, Settings, StaticLanguages, TextNodeTranslator, safe_translate,
    translate_sender_name,
};
use clap::{Arg, ArgAction, Command};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("ant-cf7")
        .version(ant_translate_cf7::VERSION)
        .about("Run Contact Form 7 payloads through the ANT Translate pipeline")
        .arg(
            Arg::new("hook")
                .help("Pipeline point (form_elements, mail_property, feedback_response, ...) or text/sender")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("input")
                .help("Payload: text, markup or JSON (a path with --file)")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .help("Read the payload from the file named by INPUT")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("target-lang")
                .long("target-lang")
                .short('t')
                .help("Target language slug (default: $ANT_CF7_TARGET_LANG)"),
        )
        .arg(
            Arg::new("current-lang")
                .long("current-lang")
                .short('c')
                .help("Language of the current page (default: unknown)"),
        )
        .arg(
            Arg::new("dictionary")
                .long("dictionary")
                .short('d')
                .help("Dictionary JSON file or directory (default: $ANT_CF7_DICTIONARY)"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock translator (appends the target language)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("admin")
                .long("admin")
                .help("Request is an admin screen")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ajax")
                .long("ajax")
                .help("Request is an admin-ajax call")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("rest")
                .long("rest")
                .help("Request is a REST call")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("referer")
                .long("referer")
                .short('r')
                .help("Referer URL of the request"),
        )
        .arg(
            Arg::new("request-uri")
                .long("request-uri")
                .help("Request URI"),
        )
        .arg(
            Arg::new("field")
                .long("field")
                .help("Name of a submitted POST field (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log pipeline decisions to stderr")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut settings = Settings::from_env()?;
    if let Some(target) = matches.get_one::<String>("target-lang") {
        settings = settings.with_target_language(target)?;
    }
    if let Some(path) = matches.get_one::<String>("dictionary") {
        settings.dictionary = Some(PathBuf::from(path));
    }

    let hook_name = matches.get_one::<String>("hook").ok_or("missing hook")?;
    let input = matches.get_one::<String>("input").ok_or("missing input")?;
    let input = if matches.get_flag("file") {
        fs::read_to_string(input)?
    } else {
        input.clone()
    };

    let plain: Option<Arc<dyn PlainTranslator>> = if matches.get_flag("mock") {
        Some(Arc::new(MockTranslator::new(MockMode::Suffix(
            settings.target_language.clone(),
        ))))
    } else {
        settings
            .load_dictionary()?
            .map(|d| Arc::new(d) as Arc<dyn PlainTranslator>)
    };
    let html = plain.clone().map(TextNodeTranslator::new);

    let current = matches
        .get_one::<String>("current-lang")
        .cloned()
        .unwrap_or_default();
    let languages = StaticLanguages::new(&current, &settings.target_language);

    let request = HostRequest {
        is_admin: matches.get_flag("admin"),
        doing_ajax: matches.get_flag("ajax"),
        serving_rest: matches.get_flag("rest"),
        referer: matches.get_one::<String>("referer").cloned(),
        referer_header: None,
        request_uri: matches.get_one::<String>("request-uri").cloned(),
        post_fields: matches
            .get_many::<String>("field")
            .map(|fields| fields.cloned().collect())
            .unwrap_or_default(),
    };

    let mut pipeline = RequestPipeline::new(
        &request,
        Collaborators {
            plain: plain.as_deref(),
            html: html.as_ref().map(|h| h as &dyn HtmlTranslator),
            languages: Some(&languages),
        },
    );

    tracing::debug!(enabled = pipeline.is_enabled(), context = ?pipeline.context(), "request");

    match hook_name.as_str() {
        "text" | "sender" => {
            if !pipeline.is_enabled() {
                println!("{}", input);
                return Ok(());
            }
            let output = if hook_name == "text" {
                safe_translate(&input, |t| pipeline.translate_plain(t))
            } else {
                translate_sender_name(&input, |t| pipeline.translate_plain(t))
            };
            println!("{}", output);
        }
        name => {
            let hook: Hook = name.parse()?;
            let payload = if hook.takes_text() {
                Value::String(input)
            } else {
                serde_json::from_str(&input)?
            };
            match pipeline.apply(hook, payload) {
                Value::String(text) => println!("{}", text),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
        }
    }

    Ok(())
}
