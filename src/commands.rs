//! Typed edit commands and the wire format the EditVideoBot API expects.
//!
//! A command line is a `", "`-joined list of `name` or `name=value` tokens,
//! e.g. `tt=hello, volume=-5, reverse`. Values are written verbatim: the
//! protocol has no escaping, so text containing `,` splits the command.

use std::fmt;
use std::str::FromStr;

use crate::error::{EvbError, Result};

/// Separator between serialized commands.
pub const COMMAND_SEPARATOR: &str = ", ";

/// Shape of the argument a command takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    None,
    Text,
    Integer,
    Float,
    IntegerOrText,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "-",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::IntegerOrText => "integer|text",
        };
        f.write_str(label)
    }
}

/// Static description of one command in the wire protocol.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub value_type: ValueType,
    pub description: &'static str,
}

const fn spec(name: &'static str, value_type: ValueType, description: &'static str) -> CommandSpec {
    CommandSpec { name, value_type, description }
}

/// Every command the service documents, in documentation order.
pub const COMMAND_TABLE: &[CommandSpec] = &[
    spec("tt", ValueType::Text, "Top text with Impact font"),
    spec("bt", ValueType::Text, "Bottom text with Impact font"),
    spec("tc", ValueType::Text, "Motivational poster style top caption"),
    spec("bc", ValueType::Text, "Motivational poster style bottom caption"),
    spec("cap", ValueType::Text, "Caption in a white box above the video"),
    spec("music", ValueType::Text, "Adds the audio of a YouTube/TikTok/SoundCloud link"),
    spec("musicskip", ValueType::Integer, "Starts the added music at the given second"),
    spec("length", ValueType::Integer, "Output length in seconds when adding music to a still image (max 45, default 15)"),
    spec("muffle", ValueType::Integer, "Muffles the audio; higher is more muffled"),
    spec("start", ValueType::Integer, "Second to start the video from"),
    spec("end", ValueType::Integer, "Second to end the video at"),
    spec("df", ValueType::Integer, "Deep fries the media (contrast, saturation, gamma)"),
    spec("er", ValueType::Integer, "Earrape: lowers audio bitrate and makes it louder"),
    spec("rc", ValueType::Integer, "Ricecake datamosh; 0 is fully random, 1-10 tune duplication"),
    spec("shake", ValueType::Integer, "Shakes the video"),
    spec("highpass", ValueType::Integer, "Removes lower audio frequencies; higher removes more"),
    spec("sketch", ValueType::Integer, "Pencil sketch effect; higher adds detail"),
    spec("spin", ValueType::Integer, "Spins the video; lower is faster"),
    spec("glow", ValueType::Integer, "Glow effect"),
    spec("technicolor", ValueType::None, "Old-fashioned cartoony technicolor effect"),
    spec("widen", ValueType::Integer, "Makes the video wider; 10 keeps the original width"),
    spec("heighten", ValueType::Integer, "Makes the video taller; 10 keeps the original height"),
    spec("rasp", ValueType::Integer, "Distorts the audio"),
    spec("echo", ValueType::Integer, "Adds an echo to the audio"),
    spec("rlag", ValueType::Integer, "Randomly shuffles video frames in chunks"),
    spec("rotate", ValueType::Integer, "Rotates the media by the given degrees"),
    spec("fadein", ValueType::Integer, "Fades in from black over the given seconds"),
    spec("fadeout", ValueType::Integer, "Fades out to black over the given seconds"),
    spec("fadeinaudio", ValueType::Integer, "Fades the audio in from silence over the given seconds"),
    spec("fadeoutaudio", ValueType::Integer, "Fades the audio out to silence over the given seconds"),
    spec("greyscale", ValueType::None, "Black and white"),
    spec("invert", ValueType::None, "Inverts the colours"),
    spec("distort", ValueType::Integer, "Wobbly distortion"),
    spec("zoom", ValueType::Integer, "Zooms in by the given factor"),
    spec("blur", ValueType::Integer, "Blurs the whole frame"),
    spec("morph", ValueType::Integer, "Motion blur"),
    spec("vignette", ValueType::Integer, "Vignette; higher is more visible"),
    spec("volume", ValueType::IntegerOrText, "Adjusts the volume; negative is quieter, accepts decibels"),
    spec("seizure", ValueType::None, "Rapidly flashes the video on and off"),
    spec("disco", ValueType::Integer, "Flashing rainbow effect"),
    spec("rgbsplit", ValueType::Integer, "Splits the red, green and blue channels apart"),
    spec("hflip", ValueType::None, "Flips horizontally"),
    spec("vflip", ValueType::None, "Flips vertically"),
    spec("downloadvid", ValueType::None, "Returns the video unedited; cannot be combined with other commands"),
    spec("reverse", ValueType::None, "Reverses video and audio; conflicts with vreverse and areverse"),
    spec("vreverse", ValueType::None, "Reverses the video only; conflicts with reverse and areverse"),
    spec("areverse", ValueType::None, "Reverses the audio only; conflicts with reverse and vreverse"),
    spec("speed", ValueType::Float, "Speeds up video and audio"),
    spec("vspeed", ValueType::Float, "Speeds up the video only"),
    spec("aspeed", ValueType::Float, "Speeds up the audio only"),
    spec("bndc", ValueType::None, "Adds a Bandicam watermark"),
];

/// Look up a command by its wire name.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_TABLE.iter().find(|spec| spec.name == name)
}

/// Argument of `volume`: a step count, or a free-form level such as `10dB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeLevel {
    Steps(i64),
    Text(String),
}

impl From<i64> for VolumeLevel {
    fn from(steps: i64) -> Self {
        Self::Steps(steps)
    }
}

impl From<i32> for VolumeLevel {
    fn from(steps: i32) -> Self {
        Self::Steps(steps.into())
    }
}

impl From<&str> for VolumeLevel {
    fn from(level: &str) -> Self {
        Self::Text(level.to_string())
    }
}

impl From<String> for VolumeLevel {
    fn from(level: String) -> Self {
        Self::Text(level)
    }
}

/// Borrowed view of a command's argument, rendered in wire form by `Display`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Argument<'a> {
    Text(&'a str),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(value) => f.write_str(&format_float(*value)),
        }
    }
}

/// Floats always carry a fractional part on the wire (`2.0`, not `2`).
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// A single edit directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TopText(String),
    BottomText(String),
    TopCaption(String),
    BottomCaption(String),
    Caption(String),
    Music(String),
    MusicSkip(i64),
    Length(i64),
    Muffle(i64),
    StartVideo(i64),
    EndVideo(i64),
    DeepFry(i64),
    EqRise(i64),
    Ricecake(i64),
    Shake(i64),
    Highpass(i64),
    Sketch(i64),
    Spin(i64),
    Glow(i64),
    Technicolor,
    Widen(i64),
    Heighten(i64),
    Rasp(i64),
    Echo(i64),
    RandomLag(i64),
    Rotate(i64),
    FadeIn(i64),
    FadeOut(i64),
    FadeInAudio(i64),
    FadeOutAudio(i64),
    Greyscale,
    InvertColours,
    Distort(i64),
    Zoom(i64),
    Blur(i64),
    Morph(i64),
    Vignette(i64),
    Volume(VolumeLevel),
    SeizureMode,
    Disco(i64),
    RgbSplit(i64),
    HorizontalFlip,
    VerticalFlip,
    DownloadVideo,
    Reverse,
    VideoReverse,
    AudioReverse,
    Speed(f64),
    VideoSpeed(f64),
    AudioSpeed(f64),
    Bandicam,
}

impl Command {
    pub fn volume(level: impl Into<VolumeLevel>) -> Self {
        Self::Volume(level.into())
    }

    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TopText(_) => "tt",
            Self::BottomText(_) => "bt",
            Self::TopCaption(_) => "tc",
            Self::BottomCaption(_) => "bc",
            Self::Caption(_) => "cap",
            Self::Music(_) => "music",
            Self::MusicSkip(_) => "musicskip",
            Self::Length(_) => "length",
            Self::Muffle(_) => "muffle",
            Self::StartVideo(_) => "start",
            Self::EndVideo(_) => "end",
            Self::DeepFry(_) => "df",
            Self::EqRise(_) => "er",
            Self::Ricecake(_) => "rc",
            Self::Shake(_) => "shake",
            Self::Highpass(_) => "highpass",
            Self::Sketch(_) => "sketch",
            Self::Spin(_) => "spin",
            Self::Glow(_) => "glow",
            Self::Technicolor => "technicolor",
            Self::Widen(_) => "widen",
            Self::Heighten(_) => "heighten",
            Self::Rasp(_) => "rasp",
            Self::Echo(_) => "echo",
            Self::RandomLag(_) => "rlag",
            Self::Rotate(_) => "rotate",
            Self::FadeIn(_) => "fadein",
            Self::FadeOut(_) => "fadeout",
            Self::FadeInAudio(_) => "fadeinaudio",
            Self::FadeOutAudio(_) => "fadeoutaudio",
            Self::Greyscale => "greyscale",
            Self::InvertColours => "invert",
            Self::Distort(_) => "distort",
            Self::Zoom(_) => "zoom",
            Self::Blur(_) => "blur",
            Self::Morph(_) => "morph",
            Self::Vignette(_) => "vignette",
            Self::Volume(_) => "volume",
            Self::SeizureMode => "seizure",
            Self::Disco(_) => "disco",
            Self::RgbSplit(_) => "rgbsplit",
            Self::HorizontalFlip => "hflip",
            Self::VerticalFlip => "vflip",
            Self::DownloadVideo => "downloadvid",
            Self::Reverse => "reverse",
            Self::VideoReverse => "vreverse",
            Self::AudioReverse => "areverse",
            Self::Speed(_) => "speed",
            Self::VideoSpeed(_) => "vspeed",
            Self::AudioSpeed(_) => "aspeed",
            Self::Bandicam => "bndc",
        }
    }

    /// The argument carried by the command, if it takes one.
    pub fn argument(&self) -> Option<Argument<'_>> {
        match self {
            Self::TopText(text)
            | Self::BottomText(text)
            | Self::TopCaption(text)
            | Self::BottomCaption(text)
            | Self::Caption(text)
            | Self::Music(text) => Some(Argument::Text(text)),

            Self::MusicSkip(value)
            | Self::Length(value)
            | Self::Muffle(value)
            | Self::StartVideo(value)
            | Self::EndVideo(value)
            | Self::DeepFry(value)
            | Self::EqRise(value)
            | Self::Ricecake(value)
            | Self::Shake(value)
            | Self::Highpass(value)
            | Self::Sketch(value)
            | Self::Spin(value)
            | Self::Glow(value)
            | Self::Widen(value)
            | Self::Heighten(value)
            | Self::Rasp(value)
            | Self::Echo(value)
            | Self::RandomLag(value)
            | Self::Rotate(value)
            | Self::FadeIn(value)
            | Self::FadeOut(value)
            | Self::FadeInAudio(value)
            | Self::FadeOutAudio(value)
            | Self::Distort(value)
            | Self::Zoom(value)
            | Self::Blur(value)
            | Self::Morph(value)
            | Self::Vignette(value)
            | Self::Disco(value)
            | Self::RgbSplit(value) => Some(Argument::Integer(*value)),

            Self::Volume(VolumeLevel::Steps(steps)) => Some(Argument::Integer(*steps)),
            Self::Volume(VolumeLevel::Text(level)) => Some(Argument::Text(level)),

            Self::Speed(factor) | Self::VideoSpeed(factor) | Self::AudioSpeed(factor) => {
                Some(Argument::Float(*factor))
            }

            Self::Technicolor
            | Self::Greyscale
            | Self::InvertColours
            | Self::SeizureMode
            | Self::HorizontalFlip
            | Self::VerticalFlip
            | Self::DownloadVideo
            | Self::Reverse
            | Self::VideoReverse
            | Self::AudioReverse
            | Self::Bandicam => None,
        }
    }

    /// Table entry for this command.
    pub fn spec(&self) -> &'static CommandSpec {
        // Every variant's name is in the table; the fallback is unreachable.
        lookup(self.name()).unwrap_or(&COMMAND_TABLE[0])
    }

    pub fn value_type(&self) -> ValueType {
        self.spec().value_type
    }

    pub fn description(&self) -> &'static str {
        self.spec().description
    }

    /// Serialize to a single wire token (`name` or `name=value`).
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    fn from_parts(spec: &CommandSpec, raw: Option<&str>) -> Result<Self> {
        let raw = match (spec.value_type, raw) {
            (ValueType::None, None) => None,
            (ValueType::None, Some(_)) => {
                return Err(EvbError::InvalidCommand(format!(
                    "`{}` does not take a value",
                    spec.name
                )));
            }
            (_, None) | (_, Some("")) => {
                return Err(EvbError::InvalidCommand(format!(
                    "`{}` requires a {} value",
                    spec.name, spec.value_type
                )));
            }
            (_, Some(raw)) => Some(raw),
        };

        let integer = || {
            raw.unwrap_or_default().parse::<i64>().map_err(|_| {
                EvbError::InvalidCommand(format!(
                    "`{}` expects an integer, got {:?}",
                    spec.name,
                    raw.unwrap_or_default()
                ))
            })
        };
        let float = || {
            raw.unwrap_or_default().parse::<f64>().map_err(|_| {
                EvbError::InvalidCommand(format!(
                    "`{}` expects a number, got {:?}",
                    spec.name,
                    raw.unwrap_or_default()
                ))
            })
        };
        let text = || raw.unwrap_or_default().to_string();

        let command = match spec.name {
            "tt" => Self::TopText(text()),
            "bt" => Self::BottomText(text()),
            "tc" => Self::TopCaption(text()),
            "bc" => Self::BottomCaption(text()),
            "cap" => Self::Caption(text()),
            "music" => Self::Music(text()),
            "musicskip" => Self::MusicSkip(integer()?),
            "length" => Self::Length(integer()?),
            "muffle" => Self::Muffle(integer()?),
            "start" => Self::StartVideo(integer()?),
            "end" => Self::EndVideo(integer()?),
            "df" => Self::DeepFry(integer()?),
            "er" => Self::EqRise(integer()?),
            "rc" => Self::Ricecake(integer()?),
            "shake" => Self::Shake(integer()?),
            "highpass" => Self::Highpass(integer()?),
            "sketch" => Self::Sketch(integer()?),
            "spin" => Self::Spin(integer()?),
            "glow" => Self::Glow(integer()?),
            "technicolor" => Self::Technicolor,
            "widen" => Self::Widen(integer()?),
            "heighten" => Self::Heighten(integer()?),
            "rasp" => Self::Rasp(integer()?),
            "echo" => Self::Echo(integer()?),
            "rlag" => Self::RandomLag(integer()?),
            "rotate" => Self::Rotate(integer()?),
            "fadein" => Self::FadeIn(integer()?),
            "fadeout" => Self::FadeOut(integer()?),
            "fadeinaudio" => Self::FadeInAudio(integer()?),
            "fadeoutaudio" => Self::FadeOutAudio(integer()?),
            "greyscale" => Self::Greyscale,
            "invert" => Self::InvertColours,
            "distort" => Self::Distort(integer()?),
            "zoom" => Self::Zoom(integer()?),
            "blur" => Self::Blur(integer()?),
            "morph" => Self::Morph(integer()?),
            "vignette" => Self::Vignette(integer()?),
            "volume" => match integer() {
                Ok(steps) => Self::Volume(VolumeLevel::Steps(steps)),
                Err(_) => Self::Volume(VolumeLevel::Text(text())),
            },
            "seizure" => Self::SeizureMode,
            "disco" => Self::Disco(integer()?),
            "rgbsplit" => Self::RgbSplit(integer()?),
            "hflip" => Self::HorizontalFlip,
            "vflip" => Self::VerticalFlip,
            "downloadvid" => Self::DownloadVideo,
            "reverse" => Self::Reverse,
            "vreverse" => Self::VideoReverse,
            "areverse" => Self::AudioReverse,
            "speed" => Self::Speed(float()?),
            "vspeed" => Self::VideoSpeed(float()?),
            "aspeed" => Self::AudioSpeed(float()?),
            "bndc" => Self::Bandicam,
            other => return Err(EvbError::InvalidCommand(format!("unknown command `{}`", other))),
        };

        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(argument) => write!(f, "{}={}", self.name(), argument),
            None => f.write_str(self.name()),
        }
    }
}

impl FromStr for Command {
    type Err = EvbError;

    /// Parse one `name` or `name=value` token.
    fn from_str(token: &str) -> Result<Self> {
        let token = token.trim();
        let (name, raw) = match token.split_once('=') {
            Some((name, raw)) => (name.trim(), Some(raw.trim())),
            None => (token, None),
        };

        let spec = lookup(name)
            .ok_or_else(|| EvbError::InvalidCommand(format!("unknown command `{}`", name)))?;

        Self::from_parts(spec, raw)
    }
}

/// Serialize an ordered list of commands into one command line.
pub fn serialize_sequence(commands: &[Command]) -> String {
    commands
        .iter()
        .map(Command::to_wire)
        .collect::<Vec<_>>()
        .join(COMMAND_SEPARATOR)
}

/// Parse a command line such as `tt=hello, volume=-5, reverse`.
pub fn parse_sequence(line: &str) -> Result<Vec<Command>> {
    line.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Command::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_command() -> Vec<Command> {
        COMMAND_TABLE
            .iter()
            .map(|spec| {
                let raw = match spec.value_type {
                    ValueType::None => None,
                    ValueType::Text => Some("word"),
                    ValueType::Integer | ValueType::IntegerOrText => Some("3"),
                    ValueType::Float => Some("1.5"),
                };
                Command::from_parts(spec, raw).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_no_argument_commands_serialize_to_bare_name() {
        for command in every_command().iter().filter(|c| c.argument().is_none()) {
            let wire = command.to_wire();
            assert_eq!(wire, command.name());
            assert!(!wire.contains('='));
        }
        assert_eq!(Command::Reverse.to_wire(), "reverse");
        assert_eq!(Command::InvertColours.to_wire(), "invert");
    }

    #[test]
    fn test_valued_commands_serialize_name_equals_value() {
        assert_eq!(Command::Length(45).to_wire(), "length=45");
        assert_eq!(Command::Speed(1.5).to_wire(), "speed=1.5");
        assert_eq!(Command::AudioSpeed(2.0).to_wire(), "aspeed=2.0");
        assert_eq!(Command::Rotate(-90).to_wire(), "rotate=-90");
        assert_eq!(Command::volume("10dB").to_wire(), "volume=10dB");
        assert_eq!(Command::Caption("when the".into()).to_wire(), "cap=when the");
    }

    #[test]
    fn test_table_matches_variants() {
        let commands = every_command();
        assert_eq!(commands.len(), COMMAND_TABLE.len());
        for (command, spec) in commands.iter().zip(COMMAND_TABLE) {
            assert_eq!(command.name(), spec.name);
            assert_eq!(command.value_type(), spec.value_type);
            assert_eq!(command.argument().is_none(), spec.value_type == ValueType::None);
        }
    }

    #[test]
    fn test_serialize_sequence() {
        assert_eq!(serialize_sequence(&[]), "");

        let commands = vec![
            Command::TopText("hello".into()),
            Command::volume(-5),
            Command::Reverse,
        ];
        assert_eq!(serialize_sequence(&commands), "tt=hello, volume=-5, reverse");

        // order preserved, duplicates kept
        let commands = vec![Command::Reverse, Command::Greyscale, Command::Reverse];
        assert_eq!(serialize_sequence(&commands), "reverse, greyscale, reverse");
    }

    #[test]
    fn test_conflicting_commands_are_not_rejected() {
        let commands = vec![Command::Reverse, Command::VideoReverse, Command::AudioReverse];
        assert_eq!(serialize_sequence(&commands), "reverse, vreverse, areverse");
    }

    #[test]
    fn test_parse_sequence_accepts_serialized_form() {
        let commands = every_command();
        let line = serialize_sequence(&commands);
        assert_eq!(parse_sequence(&line).unwrap(), commands);
    }

    #[test]
    fn test_parse_sequence_examples() {
        let parsed = parse_sequence(" tt = hello ,volume=-5,reverse ").unwrap();
        assert_eq!(
            parsed,
            vec![Command::TopText("hello".into()), Command::volume(-5), Command::Reverse]
        );
        assert_eq!(parse_sequence("").unwrap(), vec![]);
        assert_eq!(parse_sequence("speed=2").unwrap(), vec![Command::Speed(2.0)]);
        assert_eq!(parse_sequence("volume=3dB").unwrap(), vec![Command::volume("3dB")]);
        assert_eq!(
            parse_sequence("tt=a=b").unwrap(),
            vec![Command::TopText("a=b".into())]
        );
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        for bad in ["nope", "reverse=1", "length", "length=", "length=4.5", "speed=fast"] {
            let err = parse_sequence(bad).unwrap_err();
            assert!(matches!(err, EvbError::InvalidCommand(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-3.0), "-3.0");
    }
}
