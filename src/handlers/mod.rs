pub mod transcribe;

pub use transcribe::speech_to_text;
