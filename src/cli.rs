//! Command-line surface generated from the endpoint catalog.

use crate::catalog::{self, EndpointSpec, OutputMode, ParamKind, ParamSpec};
use crate::error::{PixelLabError, Result};
use crate::output::Selection;
use crate::payload::{RawArgs, RawValue};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;

const OUTPUT_ARG: &str = "output";
const SPRITESHEET_ARG: &str = "spritesheet";
const SAVE_ALL_ARG: &str = "save_all";
const PICK_ARG: &str = "pick";

/// One parsed subcommand invocation.
#[derive(Debug, Clone)]
pub struct ParsedInvocation {
    pub endpoint: &'static EndpointSpec,
    pub raw: RawArgs,
    pub output: Option<String>,
    pub selection: Selection,
    pub spritesheet: bool,
}

#[derive(Debug, Clone)]
pub enum CliOutcome {
    Invoke(ParsedInvocation),
    /// Help or version text, printed as-is
    Display(String),
}

pub fn command() -> Command {
    Command::new("pixellab")
        .version(env!("CARGO_PKG_VERSION"))
        .about("PixelLab pixel art API client; prints one JSON report per invocation")
        .subcommand_required(true)
        .subcommands(catalog::all().iter().map(endpoint_command))
}

fn endpoint_command(spec: &'static EndpointSpec) -> Command {
    let mut cmd = Command::new(spec.name).about(spec.summary);
    for param in &spec.params {
        cmd = cmd.arg(param_arg(param));
    }

    match spec.output {
        OutputMode::None => {}
        OutputMode::Single { default_path } => {
            cmd = cmd.arg(output_arg(format!("Output file path [default: {}]", default_path)));
        }
        OutputMode::Frames { default_base } => {
            cmd = cmd
                .arg(output_arg(format!(
                    "Base path for frame files [default: {}]",
                    default_base
                )))
                .arg(
                    Arg::new(SPRITESHEET_ARG)
                        .long("spritesheet")
                        .action(ArgAction::SetTrue)
                        .help("Also write the frames as one horizontal spritesheet"),
                );
        }
        OutputMode::Variations { default_base } => {
            cmd = cmd
                .arg(output_arg(format!(
                    "Output path or base for numbered files [default: {}]",
                    default_base
                )))
                .arg(
                    Arg::new(SAVE_ALL_ARG)
                        .long("save-all")
                        .action(ArgAction::SetTrue)
                        .conflicts_with(PICK_ARG)
                        .help("Save every returned variation as {base}_{i}"),
                )
                .arg(
                    Arg::new(PICK_ARG)
                        .long("pick")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .help("Save only the variation at zero-based index N"),
                );
        }
        OutputMode::Keypoints => {
            cmd = cmd.arg(output_arg("Also save keypoints as JSON to this path".to_string()));
        }
    }
    cmd
}

fn output_arg(help: String) -> Arg {
    Arg::new(OUTPUT_ARG)
        .long("output")
        .short('o')
        .value_name("PATH")
        .help(help)
}

fn param_arg(param: &ParamSpec) -> Arg {
    let mut arg = Arg::new(param.name).long(param.cli_flag()).help(param_help(param));
    arg = match param.kind {
        ParamKind::Boolean => arg.action(ArgAction::SetTrue),
        ParamKind::ImageArray => arg.num_args(1..).action(ArgAction::Append).value_name("PATH"),
        ParamKind::Image | ParamKind::PointArray(_) => arg.value_name("PATH"),
        ParamKind::Enum(values) => arg.value_name(values.join("|")),
        ParamKind::Integer | ParamKind::Float => arg.allow_negative_numbers(true),
        ParamKind::String => arg,
    };
    arg
}

fn param_help(param: &ParamSpec) -> String {
    let mut help = param.help.to_string();
    if param.required {
        help.push_str(" (required)");
    }
    if let Some(default) = param.default {
        help.push_str(&format!(" [default: {}]", default.to_json()));
    }
    if let Some(other) = param.only_with {
        help.push_str(&format!(" [only with --{}]", other.replace('_', "-")));
    }
    help
}

pub fn parse_from<I, T>(args: I) -> Result<CliOutcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => return clap_outcome(e),
    };

    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| PixelLabError::validation("subcommand", "no subcommand given"))?;
    let endpoint = catalog::lookup(name)?;
    Ok(CliOutcome::Invoke(parse_invocation(endpoint, sub)))
}

fn parse_invocation(endpoint: &'static EndpointSpec, matches: &ArgMatches) -> ParsedInvocation {
    let mut raw = RawArgs::new();
    for param in &endpoint.params {
        let value = match param.kind {
            ParamKind::Boolean => matches.get_flag(param.name).then_some(RawValue::Flag),
            ParamKind::ImageArray => matches
                .get_many::<String>(param.name)
                .map(|values| RawValue::List(values.cloned().collect())),
            _ => matches
                .get_one::<String>(param.name)
                .map(|value| RawValue::Text(value.clone())),
        };
        if let Some(value) = value {
            raw.insert(param.name.to_string(), value);
        }
    }

    // output flags only exist on some subcommands
    let output = matches
        .try_get_one::<String>(OUTPUT_ARG)
        .ok()
        .flatten()
        .cloned();
    let pick = matches.try_get_one::<usize>(PICK_ARG).ok().flatten().copied();
    let flag = |id: &str| matches!(matches.try_get_one::<bool>(id), Ok(Some(true)));
    let save_all = flag(SAVE_ALL_ARG);
    let spritesheet = flag(SPRITESHEET_ARG);

    let selection = match (pick, save_all) {
        (Some(index), _) => Selection::Pick(index),
        (None, true) => Selection::All,
        (None, false) => Selection::First,
    };

    ParsedInvocation {
        endpoint,
        raw,
        output,
        selection,
        spritesheet,
    }
}

fn clap_outcome(err: clap::Error) -> Result<CliOutcome> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            Ok(CliOutcome::Display(err.render().to_string()))
        }
        ErrorKind::MissingSubcommand => Err(PixelLabError::validation(
            "subcommand",
            "no subcommand given; run with --help to list them",
        )),
        ErrorKind::InvalidSubcommand => {
            let name = context_string(&err, ContextKind::InvalidSubcommand)
                .unwrap_or_else(|| "<unknown>".to_string());
            Err(PixelLabError::UnknownSubcommand(name))
        }
        _ => {
            let field = context_string(&err, ContextKind::InvalidArg)
                .map(|arg| arg.split_whitespace().next().unwrap_or_default().to_string())
                .unwrap_or_else(|| "arguments".to_string());
            Err(PixelLabError::validation(field, first_line(&err)))
        }
    }
}

fn context_string(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind)? {
        ContextValue::String(s) => Some(s.clone()),
        ContextValue::Strings(list) => list.first().cloned(),
        _ => None,
    }
}

fn first_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoke(args: &[&str]) -> ParsedInvocation {
        let mut full = vec!["pixellab"];
        full.extend_from_slice(args);
        match parse_from(full).unwrap() {
            CliOutcome::Invoke(parsed) => parsed,
            CliOutcome::Display(text) => panic!("unexpected help: {}", text),
        }
    }

    #[test]
    fn test_command_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn test_flags_are_kebab_case() {
        let parsed = invoke(&[
            "generate-pixflux",
            "--description",
            "a knight",
            "--text-guidance-scale",
            "3.5",
            "--no-background",
            "-o",
            "knight.png",
        ]);
        assert_eq!(parsed.endpoint.name, "generate-pixflux");
        assert_eq!(
            parsed.raw.get("text_guidance_scale"),
            Some(&RawValue::Text("3.5".into()))
        );
        assert_eq!(parsed.raw.get("no_background"), Some(&RawValue::Flag));
        assert_eq!(parsed.output.as_deref(), Some("knight.png"));
        assert_eq!(parsed.selection, Selection::First);
    }

    #[test]
    fn test_variation_selection_flags() {
        let parsed = invoke(&["generate-image", "--description", "slime", "--save-all"]);
        assert_eq!(parsed.selection, Selection::All);

        let parsed = invoke(&["generate-image", "--description", "slime", "--pick", "5"]);
        assert_eq!(parsed.selection, Selection::Pick(5));

        let err = parse_from([
            "pixellab",
            "generate-image",
            "--description",
            "slime",
            "--pick",
            "2",
            "--save-all",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_frame_flags_and_image_lists() {
        let parsed = invoke(&[
            "edit-images",
            "--method",
            "edit_with_text",
            "--description",
            "add a hat",
            "--edit-frames",
            "a.png",
            "b.png",
            "--save-all",
        ]);
        assert_eq!(
            parsed.raw.get("edit_frames"),
            Some(&RawValue::List(vec!["a.png".into(), "b.png".into()]))
        );
        assert_eq!(parsed.selection, Selection::All);
        assert!(!parsed.spritesheet);

        let err = parse_from([
            "pixellab",
            "edit-images",
            "--method",
            "edit_with_text",
            "--edit-frames",
            "a.png",
            "--spritesheet",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let parsed = invoke(&[
            "animate-text",
            "--description",
            "x",
            "--action",
            "walk",
            "--reference-image",
            "r.png",
            "--spritesheet",
        ]);
        assert!(parsed.spritesheet);
    }

    #[test]
    fn test_negative_numbers_are_values() {
        let parsed = invoke(&["generate-pixflux", "--description", "x", "--seed", "-1"]);
        assert_eq!(parsed.raw.get("seed"), Some(&RawValue::Text("-1".into())));
    }

    #[test]
    fn test_parse_errors_become_reports() {
        let err = parse_from(["pixellab", "make-coffee"]).unwrap_err();
        assert!(matches!(err, PixelLabError::UnknownSubcommand(ref name) if name == "make-coffee"));

        let err = parse_from(["pixellab", "balance", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_help_is_displayed() {
        match parse_from(["pixellab", "--help"]).unwrap() {
            CliOutcome::Display(text) => assert!(text.contains("generate-pixflux")),
            CliOutcome::Invoke(_) => panic!("expected help text"),
        }
        assert!(matches!(
            parse_from(["pixellab", "--version"]).unwrap(),
            CliOutcome::Display(_)
        ));
    }

    #[test]
    fn test_bare_invocation_is_a_usage_error() {
        let err = parse_from(["pixellab"]).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(matches!(
            err,
            PixelLabError::ValidationError { ref field, .. } if field == "subcommand"
        ));
    }
}
