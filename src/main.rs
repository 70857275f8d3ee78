use std::sync::Arc;

use exam_quiz_bot::config::Config;
use exam_quiz_bot::quiz::{Completeness, QuestionBank, Session, SessionError, SubmitToken, Thresholds};
use exam_quiz_bot::render;
use log::{debug, info, warn};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    ChooseSubject,
    Answering {
        session: Session,
        cursor: usize,
    },
    Confirming {
        session: Session,
        token: SubmitToken,
    },
    Reviewing {
        session: Session,
    },
}

/// Questions and default feedback thresholds, shared by every chat.
struct Catalog {
    bank: QuestionBank,
    thresholds: Thresholds,
}

#[tokio::main]
async fn main() -> HandlerResult {
    // Loads .env before the logger so RUST_LOG from the file applies.
    let config = Config::from_env()?;
    pretty_env_logger::init();
    info!("Starting exam quiz bot...");

    let bank = match &config.bank_path {
        Some(path) => {
            info!("Loading question bank from {}", path.display());
            QuestionBank::open(path)?
        }
        None => QuestionBank::embedded()?,
    };
    for issue in bank.validate(config.thresholds) {
        warn!("Question bank: {issue}");
    }
    info!("Question bank loaded, {} subjects", bank.subjects().len());

    let catalog = Arc::new(Catalog {
        bank,
        thresholds: config.thresholds,
    });
    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, InMemStorage<State>, State>()
            .branch(dptree::filter(|msg: Message| msg.text() == Some("/start")).endpoint(start))
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ChooseSubject].endpoint(choose_subject))
            .branch(dptree::case![State::Answering { session, cursor }].endpoint(answering))
            .branch(dptree::case![State::Confirming { session, token }].endpoint(confirming))
            .branch(dptree::case![State::Reviewing { session }].endpoint(reviewing)),
    )
    .dependencies(dptree::deps![InMemStorage::<State>::new(), catalog])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

fn subject_keyboard(catalog: &Catalog) -> KeyboardMarkup {
    KeyboardMarkup::new(
        catalog
            .bank
            .subjects()
            .iter()
            .map(|subject| vec![KeyboardButton::new(render::subject_button(subject))]),
    )
}

fn answer_keyboard(session: &Session, position: usize) -> KeyboardMarkup {
    let labels = session
        .question(position)
        .map(|question| {
            (0..question.option_count())
                .map(|index| KeyboardButton::new(render::option_label(question, index)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    KeyboardMarkup::new(vec![labels, vec![KeyboardButton::new(render::SUBMIT_BUTTON)]])
}

fn submit_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(render::SUBMIT_BUTTON)]])
}

fn confirm_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(render::CONFIRM_YES),
        KeyboardButton::new(render::CONFIRM_NO),
    ]])
}

fn review_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(render::RETRY_BUTTON),
        KeyboardButton::new(render::SUBJECTS_BUTTON),
    ]])
}

async fn ask(bot: &Bot, chat: ChatId, session: &Session, position: usize) -> HandlerResult {
    let Some(question) = session.question(position) else {
        return Ok(());
    };
    let selected = session.answer(position)?;
    bot.send_message(chat, render::question_card(position, question, selected))
        .reply_markup(answer_keyboard(session, position))
        .await?;
    Ok(())
}

async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    catalog: Arc<Catalog>,
    msg: Message,
) -> HandlerResult {
    bot.send_message(msg.chat.id, render::subject_list(catalog.bank.subjects()))
        .reply_markup(subject_keyboard(&catalog))
        .await?;
    dialogue.update(State::ChooseSubject).await?;
    Ok(())
}

async fn choose_subject(
    bot: Bot,
    dialogue: QuizDialogue,
    catalog: Arc<Catalog>,
    msg: Message,
) -> HandlerResult {
    let subject = match msg.text().and_then(|text| catalog.bank.subject(text.trim())) {
        Some(subject) => subject,
        None => {
            bot.send_message(msg.chat.id, render::UNKNOWN_SUBJECT)
                .reply_markup(subject_keyboard(&catalog))
                .await?;
            return Ok(());
        }
    };

    let thresholds = subject.thresholds_or(catalog.thresholds);
    // The thread rng must not live across an await point.
    let started = Session::start(subject.questions.clone(), thresholds, &mut rand::thread_rng());
    let session = match started {
        Ok(session) => session,
        Err(err) => {
            warn!("Cannot start subject {:?}: {err}", subject.name);
            bot.send_message(msg.chat.id, render::UNKNOWN_SUBJECT)
                .reply_markup(subject_keyboard(&catalog))
                .await?;
            return Ok(());
        }
    };
    info!(
        "Chat {} started {:?} with {} questions",
        msg.chat.id.0,
        subject.name,
        session.len()
    );

    ask(&bot, msg.chat.id, &session, 0).await?;
    dialogue
        .update(State::Answering { session, cursor: 0 })
        .await?;
    Ok(())
}

async fn answering(
    bot: Bot,
    dialogue: QuizDialogue,
    (mut session, cursor): (Session, usize),
    msg: Message,
) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text,
        None => {
            bot.send_message(msg.chat.id, render::PICK_AN_OPTION).await?;
            return Ok(());
        }
    };

    if text == render::SUBMIT_BUTTON {
        return request_submit(bot, dialogue, session, msg.chat.id).await;
    }

    if let Some(target) = render::parse_jump(text) {
        if target >= session.len() {
            bot.send_message(msg.chat.id, render::no_such_question(session.len()))
                .await?;
            return Ok(());
        }
        ask(&bot, msg.chat.id, &session, target).await?;
        dialogue
            .update(State::Answering {
                session,
                cursor: target,
            })
            .await?;
        return Ok(());
    }

    let choice = session
        .question(cursor)
        .and_then(|question| render::parse_choice(question, text));
    let choice = match choice {
        Some(choice) => choice,
        None => {
            bot.send_message(msg.chat.id, render::PICK_AN_OPTION)
                .reply_markup(answer_keyboard(&session, cursor))
                .await?;
            return Ok(());
        }
    };
    session.set_answer(cursor, choice)?;
    debug!("Chat {} answered question {} with {}", msg.chat.id.0, cursor + 1, choice);

    match session.completeness() {
        Completeness::Incomplete { position } => {
            bot.send_message(msg.chat.id, render::progress(&session)).await?;
            ask(&bot, msg.chat.id, &session, position).await?;
            dialogue
                .update(State::Answering {
                    session,
                    cursor: position,
                })
                .await?;
        }
        Completeness::Complete => {
            bot.send_message(msg.chat.id, render::all_answered())
                .reply_markup(submit_keyboard())
                .await?;
            dialogue
                .update(State::Answering { session, cursor })
                .await?;
        }
    }
    Ok(())
}

async fn request_submit(
    bot: Bot,
    dialogue: QuizDialogue,
    session: Session,
    chat: ChatId,
) -> HandlerResult {
    match session.request_submit() {
        Ok(token) => {
            bot.send_message(chat, render::CONFIRM_PROMPT)
                .reply_markup(confirm_keyboard())
                .await?;
            dialogue
                .update(State::Confirming { session, token })
                .await?;
        }
        Err(SessionError::Incomplete { position }) => {
            bot.send_message(chat, render::incomplete_warning(position))
                .await?;
            ask(&bot, chat, &session, position).await?;
            dialogue
                .update(State::Answering {
                    session,
                    cursor: position,
                })
                .await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn confirming(
    bot: Bot,
    dialogue: QuizDialogue,
    (mut session, token): (Session, SubmitToken),
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(render::CONFIRM_YES) => {
            let result = session.confirm_submit(token)?.clone();
            info!(
                "Chat {} scored {}/{} ({:?})",
                msg.chat.id.0, result.score, result.total, result.tier
            );

            bot.send_message(msg.chat.id, render::SUBMITTED_NOTICE)
                .await?;
            bot.send_message(msg.chat.id, render::score_message(&result))
                .await?;
            bot.send_message(msg.chat.id, render::result_summary(&result))
                .reply_markup(review_keyboard())
                .await?;
            let entries = render::review_entries(&session, &result);
            for page in render::paginate(&entries, render::MESSAGE_LIMIT) {
                bot.send_message(msg.chat.id, page).await?;
            }

            dialogue.update(State::Reviewing { session }).await?;
        }
        Some(render::CONFIRM_NO) => {
            let cursor = session.len().saturating_sub(1);
            bot.send_message(msg.chat.id, render::all_answered()).await?;
            ask(&bot, msg.chat.id, &session, cursor).await?;
            dialogue
                .update(State::Answering { session, cursor })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, render::PICK_A_BUTTON)
                .reply_markup(confirm_keyboard())
                .await?;
        }
    }
    Ok(())
}

async fn reviewing(
    bot: Bot,
    dialogue: QuizDialogue,
    catalog: Arc<Catalog>,
    mut session: Session,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(render::RETRY_BUTTON) => {
            session.retry(&mut rand::thread_rng())?;
            info!("Chat {} is retrying", msg.chat.id.0);

            bot.send_message(msg.chat.id, render::RETRY_NOTICE).await?;
            ask(&bot, msg.chat.id, &session, 0).await?;
            dialogue
                .update(State::Answering { session, cursor: 0 })
                .await?;
        }
        Some(render::SUBJECTS_BUTTON) => {
            return start(bot, dialogue, catalog, msg).await;
        }
        _ => {
            let reply = match session.result() {
                Some(result) => format!("{}\n\n{}", render::score_message(result), render::PICK_A_BUTTON),
                None => render::PICK_A_BUTTON.to_string(),
            };
            bot.send_message(msg.chat.id, reply)
                .reply_markup(review_keyboard())
                .await?;
        }
    }
    Ok(())
}
