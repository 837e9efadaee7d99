mod http_audio;
mod mock_clients;
mod openai_lyrics;

pub use http_audio::HttpAudioClient;
pub use mock_clients::{MockAudioClient, MockLyricsClient};
pub use openai_lyrics::OpenAiLyricsClient;
