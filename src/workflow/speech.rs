//! 朗读文本
//!
//! 只生成要朗读的内容和语音参数，由展示层决定如何播放。

use crate::models::question::{Question, OPTION_LETTERS};
use crate::workflow::view::strip_html;

pub const SPEECH_LANG: &str = "pt-BR";
pub const SPEECH_RATE: f32 = 0.9;
pub const SPEECH_PITCH: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: &'static str,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: SPEECH_LANG,
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
        }
    }
}

/// 朗读题干
pub fn question_utterance(question: &Question) -> Utterance {
    Utterance::new(strip_html(&question.text))
}

/// 朗读全部选项：`Opção A: …. Opção B: …`
pub fn options_utterance(question: &Question) -> Utterance {
    let text = question
        .options
        .iter()
        .zip(OPTION_LETTERS.iter())
        .map(|(option, letter)| format!("Opção {}: {}", letter, strip_html(option)))
        .collect::<Vec<_>>()
        .join(". ");
    Utterance::new(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_question;

    #[test]
    fn reads_all_options_with_letters() {
        let u = options_utterance(&sample_question());
        assert_eq!(
            u.text,
            "Opção A: São Paulo. Opção B: Brasília. Opção C: Rio de Janeiro. Opção D: Salvador"
        );
        assert_eq!(u.lang, "pt-BR");
        assert_eq!(u.rate, 0.9);
    }

    #[test]
    fn question_text_is_plain() {
        let mut q = sample_question();
        q.text = "<p>Qual é a capital?</p>".to_string();
        assert_eq!(question_utterance(&q).text, "Qual é a capital?");
    }
}
