//! Text shown to the user. Everything human readable lives here so the quiz
//! engine only deals in positions, indices and tiers.

use chrono::{DateTime, Datelike, FixedOffset, Utc};

use crate::quiz::{FeedbackTier, Question, QuizResult, Session, Severity, Subject};

/// Labels for options that are written without one.
pub const CHOICE_LABELS: [&str; 4] = ["ก", "ข", "ค", "ง"];

/// Telegram rejects messages longer than 4096 characters.
pub const MESSAGE_LIMIT: usize = 4000;

pub const SUBMIT_BUTTON: &str = "ส่งคำตอบ";
pub const CONFIRM_YES: &str = "ยืนยันส่งคำตอบ";
pub const CONFIRM_NO: &str = "กลับไปแก้คำตอบ";
pub const RETRY_BUTTON: &str = "ทำข้อสอบใหม่";
pub const SUBJECTS_BUTTON: &str = "เลือกวิชา";

pub const TITLE: &str = "ข้อสอบครูผู้ช่วย สำหรับ ออม";
pub const RESULT_TITLE: &str = "ผลการทดสอบ ข้อสอบครูผู้ช่วย สำหรับ ออม";
pub const CHOOSE_SUBJECT: &str = "เลือกวิชาที่ต้องการทำข้อสอบ";
pub const UNKNOWN_SUBJECT: &str = "ไม่พบวิชานี้ กรุณาเลือกจากปุ่มด้านล่าง";
pub const CONFIRM_PROMPT: &str = "คุณแน่ใจหรือไม่ว่าจะส่งคำตอบ?";
pub const SUBMITTED_NOTICE: &str = "ส่งคำตอบเรียบร้อย\nดูผลคะแนนและรีวิวข้อสอบด้านล่าง";
pub const RETRY_NOTICE: &str = "เริ่มข้อสอบใหม่\nพร้อมทำข้อสอบแล้ว ขอให้โชคดี!";
pub const PICK_AN_OPTION: &str = "กรุณาเลือกคำตอบจากปุ่มด้านล่าง หรือพิมพ์ #เลขข้อ เพื่อไปยังข้อนั้น";
pub const PICK_A_BUTTON: &str = "กรุณาเลือกจากปุ่มด้านล่าง";

/// Button text for an option. Label-encoded questions show their own labels
/// unless two options share one, then every option gets a choice label.
pub fn option_label(question: &Question, index: usize) -> String {
    if let Some(labels) = own_labels(question) {
        if let Some(label) = labels.get(index) {
            return label.to_string();
        }
    }
    CHOICE_LABELS
        .get(index)
        .map(|label| label.to_string())
        .unwrap_or_else(|| (index + 1).to_string())
}

/// An option as the user reads it, label included.
pub fn option_line(question: &Question, index: usize) -> String {
    let text = question.options.get(index).map(String::as_str).unwrap_or_default();
    if own_labels(question).is_some() {
        text.to_string()
    } else {
        format!("{}. {}", option_label(question, index), text)
    }
}

fn own_labels(question: &Question) -> Option<Vec<&str>> {
    if question.answer.is_label() {
        question.distinct_labels()
    } else {
        None
    }
}

/// Maps a pressed button (or typed label) back to an option index.
pub fn parse_choice(question: &Question, text: &str) -> Option<usize> {
    let text = text.trim().trim_end_matches(['.', ')']);
    (0..question.option_count()).find(|&index| option_label(question, index) == text)
}

/// `#5` -> position 4.
pub fn parse_jump(text: &str) -> Option<usize> {
    let number = text.trim().strip_prefix('#')?.trim().parse::<usize>().ok()?;
    number.checked_sub(1)
}

pub fn subject_button(subject: &Subject) -> String {
    subject.name.clone()
}

pub fn subject_list(subjects: &[Subject]) -> String {
    let lines = subjects
        .iter()
        .map(|s| format!("• {} ({} ข้อ)", s.name, s.len()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{TITLE}\n{CHOOSE_SUBJECT}\n\n{lines}")
}

pub fn question_card(position: usize, question: &Question, selected: Option<usize>) -> String {
    let options = (0..question.option_count())
        .map(|index| {
            let marker = if selected == Some(index) { "👉 " } else { "" };
            format!("{marker}{}", option_line(question, index))
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}. {}\n\n{}", position + 1, question.prompt, options)
}

pub fn progress(session: &Session) -> String {
    format!("ตอบแล้ว {}/{} ข้อ", session.answered(), session.len())
}

pub fn all_answered() -> String {
    format!("ตอบครบทุกข้อแล้ว กด \"{SUBMIT_BUTTON}\" เพื่อส่งคำตอบ หรือพิมพ์ #เลขข้อ เพื่อแก้คำตอบ")
}

pub fn incomplete_warning(position: usize) -> String {
    format!(
        "กรุณาตอบคำถามให้ครบ\nกรุณาตอบคำถามข้อที่ {} ให้ครบก่อนส่งคำตอบ",
        position + 1
    )
}

pub fn no_such_question(total: usize) -> String {
    format!("ไม่มีข้อนี้ กรุณาเลือกข้อ 1 ถึง {total}")
}

pub fn tier_message(tier: FeedbackTier) -> &'static str {
    match tier {
        FeedbackTier::KeepStudying => "เก่งแล้วรักเหมือนเดิมนะ แต่ไปอ่านหนังสือเพิ่มด้วยนะ",
        FeedbackTier::Good => "เก่งมาก รัก ๆ น้า",
        FeedbackTier::Great => "สุดยอดดด รักที่สุด",
        FeedbackTier::Outstanding => "โอ้ววว รักคุณครูคนนี้ที่สุด",
    }
}

pub fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Danger => "📚",
        Severity::Neutral => "👍",
        Severity::Success => "🎉",
        Severity::Highlight => "🏆",
    }
}

pub fn score_message(result: &QuizResult) -> String {
    format!(
        "{} ได้ {}/{}\n{}",
        severity_marker(result.tier.severity()),
        result.score,
        result.total,
        tier_message(result.tier)
    )
}

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// Bangkok, UTC+7.
const THAI_OFFSET_SECS: i32 = 7 * 3600;
const BUDDHIST_ERA_OFFSET: i32 = 543;

fn thai_time(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(THAI_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset),
        None => at.into(),
    }
}

/// `19 ตุลาคม 2569`, Thai month name and Buddhist-era year.
pub fn thai_date(at: DateTime<Utc>) -> String {
    let local = thai_time(at);
    let month = THAI_MONTHS.get(local.month0() as usize).copied().unwrap_or_default();
    format!("{} {} {}", local.day(), month, local.year() + BUDDHIST_ERA_OFFSET)
}

pub fn thai_clock(at: DateTime<Utc>) -> String {
    thai_time(at).format("%H:%M:%S").to_string()
}

/// The shareable summary: title, score and when the answers were sent.
pub fn result_summary(result: &QuizResult) -> String {
    format!(
        "{RESULT_TITLE}\n\n{}\n\nวันที่ส่งข้อสอบ: {}\nเวลา: {}",
        score_message(result),
        thai_date(result.submitted_at),
        thai_clock(result.submitted_at)
    )
}

/// One review block per question, in the order the user saw them.
pub fn review_entries(session: &Session, result: &QuizResult) -> Vec<String> {
    session
        .questions()
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let chosen = session.answers().get(position).copied().flatten();
            review_entry(position, question, chosen, result)
        })
        .collect()
}

fn review_entry(
    position: usize,
    question: &Question,
    chosen: Option<usize>,
    result: &QuizResult,
) -> String {
    let correct = result.correct.get(position).copied().unwrap_or(false);
    let mut lines = vec![
        format!("{}. {}", position + 1, question.prompt),
        if correct { "✅ ถูกต้อง" } else { "❌ ผิด" }.to_string(),
    ];

    match question.answer_index() {
        Some(key) => lines.push(format!("คำตอบที่ถูก: {}", option_line(question, key))),
        None => lines.push("⚠️ ข้อนี้ไม่มีเฉลยที่ถูกต้อง จึงไม่นับคะแนน".to_string()),
    }
    if let Some(chosen) = chosen {
        lines.push(format!("คุณเลือก: {}", option_line(question, chosen)));
    }
    if let Some(explanation) = &question.explanation {
        lines.push(format!("💡 {explanation}"));
    }

    lines.join("\n")
}

/// Packs blocks into as few messages as fit under `limit` characters. A
/// block longer than `limit` gets a message of its own.
pub fn paginate(blocks: &[String], limit: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = String::new();

    for block in blocks {
        let needed = if page.is_empty() {
            block.chars().count()
        } else {
            page.chars().count() + 2 + block.chars().count()
        };
        if needed > limit && !page.is_empty() {
            pages.push(std::mem::take(&mut page));
        }
        if !page.is_empty() {
            page.push_str("\n\n");
        }
        page.push_str(block);
    }
    if !page.is_empty() {
        pages.push(page);
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{AnswerKey, Thresholds};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn plain() -> Question {
        Question::new(
            1,
            "สองบวกสอง",
            vec!["3".into(), "4".into(), "5".into(), "6".into()],
            AnswerKey::Index(1),
        )
        .with_explanation("2 + 2 = 4")
    }

    fn labelled() -> Question {
        Question::new(
            2,
            "ข้อใดถูก",
            vec!["ก. หนึ่ง".into(), "ข. สอง".into(), "ค. สาม".into(), "ง. สี่".into()],
            AnswerKey::Label("ค".into()),
        )
    }

    #[test]
    fn unlabelled_options_get_thai_choice_labels() {
        let q = plain();
        assert_eq!(option_label(&q, 0), "ก");
        assert_eq!(option_line(&q, 1), "ข. 4");
        assert_eq!(option_label(&q, 7), "8");
    }

    #[test]
    fn labelled_options_keep_their_own_text() {
        let q = labelled();
        assert_eq!(option_label(&q, 2), "ค");
        assert_eq!(option_line(&q, 2), "ค. สาม");
    }

    #[test]
    fn repeated_labels_fall_back_to_choice_labels() {
        let q = Question::new(
            3,
            "ซ้ำ",
            vec!["A. one".into(), "A. two".into(), "C. x".into(), "D. y".into()],
            AnswerKey::Label("C".into()),
        );
        let buttons = (0..4).map(|index| option_label(&q, index)).collect::<Vec<_>>();
        assert_eq!(buttons, CHOICE_LABELS.to_vec());
        assert_eq!(parse_choice(&q, "ข"), Some(1));
        assert_eq!(parse_choice(&q, "A"), None);
        assert_eq!(option_line(&q, 1), "ข. A. two");
    }

    #[test]
    fn choices_parse_back_from_buttons() {
        let q = plain();
        assert_eq!(parse_choice(&q, "ก"), Some(0));
        assert_eq!(parse_choice(&q, " ง. "), Some(3));
        assert_eq!(parse_choice(&q, "จ"), None);
        assert_eq!(parse_choice(&labelled(), "ข"), Some(1));
    }

    #[test]
    fn jumps_are_one_based() {
        assert_eq!(parse_jump("#1"), Some(0));
        assert_eq!(parse_jump(" # 12 "), Some(11));
        assert_eq!(parse_jump("#0"), None);
        assert_eq!(parse_jump("12"), None);
        assert_eq!(parse_jump("#x"), None);
    }

    #[test]
    fn card_marks_the_selected_option() {
        let card = question_card(4, &plain(), Some(2));
        assert!(card.starts_with("5. สองบวกสอง"));
        assert!(card.contains("👉 ค. 5"));
        assert!(!card.contains("👉 ก. 3"));
    }

    #[test]
    fn incomplete_warning_names_the_human_question_number() {
        assert!(incomplete_warning(0).contains("ข้อที่ 1 "));
        assert!(incomplete_warning(6).contains("ข้อที่ 7 "));
    }

    fn great_result() -> QuizResult {
        QuizResult {
            score: 16,
            total: 20,
            correct: vec![],
            tier: FeedbackTier::Great,
            ungradable: vec![],
            submitted_at: Utc.with_ymd_and_hms(2026, 10, 19, 7, 5, 9).unwrap(),
        }
    }

    #[test]
    fn score_message_uses_the_original_wording() {
        assert_eq!(score_message(&great_result()), "🎉 ได้ 16/20\nสุดยอดดด รักที่สุด");
    }

    #[test]
    fn summary_has_title_score_and_bangkok_timestamp() {
        assert_eq!(
            result_summary(&great_result()),
            "ผลการทดสอบ ข้อสอบครูผู้ช่วย สำหรับ ออม\n\n\
             🎉 ได้ 16/20\nสุดยอดดด รักที่สุด\n\n\
             วันที่ส่งข้อสอบ: 19 ตุลาคม 2569\nเวลา: 14:05:09"
        );
    }

    #[test]
    fn thai_date_rolls_over_at_bangkok_midnight() {
        let late = Utc.with_ymd_and_hms(2026, 12, 31, 17, 30, 0).unwrap();
        assert_eq!(thai_date(late), "1 มกราคม 2570");
        assert_eq!(thai_clock(late), "00:30:00");
    }

    #[test]
    fn review_shows_answer_choice_and_explanation() {
        let third = Question::new(
            3,
            "ข้อสาม",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerKey::Index(0),
        );
        let bank = Arc::new(vec![plain(), labelled(), third]);
        let mut session = Session::start(
            bank,
            Thresholds::new(0, 1, 2).unwrap(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        for position in 0..session.len() {
            session.set_answer(position, 0).unwrap();
        }
        let token = session.request_submit().unwrap();
        let result = session.confirm_submit(token).unwrap().clone();

        let entries = review_entries(&session, &result);
        assert_eq!(entries.len(), 3);
        let plain_entry = entries.iter().find(|e| e.contains("สองบวกสอง")).unwrap();
        assert!(plain_entry.contains("❌ ผิด"));
        assert!(plain_entry.contains("คำตอบที่ถูก: ข. 4"));
        assert!(plain_entry.contains("คุณเลือก: ก. 3"));
        assert!(plain_entry.contains("💡 2 + 2 = 4"));
    }

    #[test]
    fn paginate_packs_blocks_under_the_limit() {
        let blocks = vec!["a".repeat(10), "b".repeat(10), "c".repeat(10), "d".repeat(30)];
        let pages = paginate(&blocks, 25);
        assert_eq!(
            pages,
            vec![
                format!("{}\n\n{}", "a".repeat(10), "b".repeat(10)),
                "c".repeat(10),
                "d".repeat(30),
            ]
        );
        assert!(paginate(&[], 25).is_empty());
    }
}
