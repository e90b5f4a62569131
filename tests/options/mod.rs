//! Command rendering through the public builder.

use ffwrap::options::{expand_all, no_options, CommandLine, FfmpegOption, OptionArg, OptionValue};
use ffwrap::Ffmpeg;

#[test]
fn option_with_value_renders_two_tokens() {
    let option = FfmpegOption::new("b:v", Some(OptionValue::from("2M")));
    assert_eq!(option.build(), vec!["-b:v", "2M"]);
}

#[test]
fn option_without_value_renders_one_token() {
    assert_eq!(FfmpegOption::flag("y").build(), vec!["-y"]);
}

#[test]
fn numeric_values_render_with_display() {
    let options = expand_all([("ss", OptionArg::from(1.5)), ("frames:v", OptionArg::from(10))]);
    let rendered: Vec<String> = options.iter().flat_map(FfmpegOption::build).collect();
    assert_eq!(rendered, vec!["-ss", "1.5", "-frames:v", "10"]);
}

#[test]
fn builder_groups_globals_inputs_outputs() {
    let ffmpeg = Ffmpeg::with_executable("ffmpeg")
        .output("out.mkv", [("map", vec!["0:v", "1:a"])])
        .input("video.mp4", [("ss", OptionArg::from(3)), ("t", OptionArg::from(10))])
        .flag("y")
        .input("audio.wav", no_options())
        .option("loglevel", "error");

    assert_eq!(
        ffmpeg.arguments(),
        vec![
            "ffmpeg", "-y", "-loglevel", "error", "-ss", "3", "-t", "10", "-i", "video.mp4",
            "-i", "audio.wav", "-map", "0:v", "-map", "1:a", "out.mkv",
        ]
    );
}

#[test]
fn optional_value_none_is_a_flag() {
    let ffmpeg = Ffmpeg::new()
        .option("n", None::<&str>)
        .option("threads", Some(4));
    assert_eq!(ffmpeg.arguments(), vec!["ffmpeg", "-n", "-threads", "4"]);
}

#[test]
fn command_line_accessors_keep_addition_order() {
    let mut command = CommandLine::new();
    command.input("a.mp4", no_options());
    command.input("b.mp4", no_options());
    command.output("c.mp4", no_options());

    let urls: Vec<&str> = command.inputs().iter().map(|f| f.url()).collect();
    assert_eq!(urls, vec!["a.mp4", "b.mp4"]);
    assert_eq!(command.outputs()[0].url(), "c.mp4");
}

#[test]
#[cfg(unix)]
fn command_line_is_shell_escaped() {
    let ffmpeg = Ffmpeg::new()
        .input("my clip.mp4", no_options())
        .output("out.mp4", no_options());
    assert_eq!(ffmpeg.command_line(), "ffmpeg -i 'my clip.mp4' out.mp4");
}
