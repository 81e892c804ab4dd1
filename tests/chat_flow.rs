use crux_core::testing::AppTester;
use crux_kv::KeyValueOperation;
use empowerher_core::capabilities::{TimerId, TimerOperation};
use empowerher_core::chat::{
    self, ChatChannel, COMMUNITY_REPLIES, COMMUNITY_ROSTER, SUPPORT_GREETING, SUPPORT_REPLIES,
};
use empowerher_core::{App, Effect, Event, Model};

fn timer_ops(effects: &[Effect]) -> Vec<TimerOperation> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Timer(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

fn oneshot_timer(effects: &[Effect]) -> (TimerId, u64) {
    match timer_ops(effects).as_slice() {
        [TimerOperation::Oneshot { id, delay_ms }] => (*id, *delay_ms),
        other => panic!("expected one oneshot timer, got {other:?}"),
    }
}

fn log_in(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(
        Event::LoginSubmitted {
            name: "Maya".into(),
            email: "maya@example.com".into(),
        },
        model,
    );
}

#[test]
fn support_chat_opens_with_a_single_greeting() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::SupportChatOpened, &mut model);
    app.update(Event::SupportChatOpened, &mut model);

    assert_eq!(model.support_chat.len(), 1);
    assert_eq!(model.support_chat[0].body, SUPPORT_GREETING);
    assert!(!model.support_chat[0].from_me);
}

#[test]
fn sending_schedules_a_reply_after_one_second() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Support,
            text: "I feel unsafe walking home".into(),
        },
        &mut model,
    );

    assert_eq!(model.support_chat.len(), 1);
    assert!(model.support_chat[0].from_me);
    let (_, delay_ms) = oneshot_timer(&update.effects);
    assert_eq!(delay_ms, 1_000);
}

#[test]
fn the_reply_is_a_deterministic_pick_for_a_fixed_seed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    model.chat_rng_state = 42;
    let mut expected_seed = 42;
    let expected = chat::pick(&mut expected_seed, SUPPORT_REPLIES);

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Support,
            text: "hello".into(),
        },
        &mut model,
    );
    let (timer, _) = oneshot_timer(&update.effects);
    app.update(
        Event::ChatReplyDue {
            channel: ChatChannel::Support,
            timer,
        },
        &mut model,
    );

    assert_eq!(model.support_chat.len(), 2);
    let reply = &model.support_chat[1];
    assert_eq!(reply.body, expected);
    assert_eq!(reply.sender, "Support");
    assert!(!reply.from_me);
}

#[test]
fn a_reply_fires_once_per_sent_message() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Support,
            text: "hello".into(),
        },
        &mut model,
    );
    let (timer, _) = oneshot_timer(&update.effects);

    app.update(
        Event::ChatReplyDue {
            channel: ChatChannel::Support,
            timer,
        },
        &mut model,
    );
    app.update(
        Event::ChatReplyDue {
            channel: ChatChannel::Support,
            timer,
        },
        &mut model,
    );

    assert_eq!(model.support_chat.len(), 2);
}

#[test]
fn blank_messages_are_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Support,
            text: "   ".into(),
        },
        &mut model,
    );

    assert!(model.support_chat.is_empty());
    assert!(update.effects.is_empty());
}

#[test]
fn community_chat_requires_a_session() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::CommunityChatOpened, &mut model);
    assert!(model.community_chat.is_empty());
    assert_eq!(
        model.notice.as_ref().unwrap().title,
        "Authentication required"
    );

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Community,
            text: "hi".into(),
        },
        &mut model,
    );
    assert!(model.community_chat.is_empty());
    assert!(timer_ops(&update.effects).is_empty());
}

#[test]
fn community_chat_opens_with_seed_messages_once_logged_in() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    log_in(&app, &mut model);

    app.update(Event::CommunityChatOpened, &mut model);

    assert_eq!(model.community_chat.len(), 4);
    assert_eq!(model.community_chat[0].sender, "EmpowerHer");
    assert!(model
        .community_chat
        .windows(2)
        .all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms));
}

#[test]
fn community_messages_carry_the_session_name_and_roster_replies() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    model.chat_rng_state = 7;
    log_in(&app, &mut model);
    app.update(Event::CommunityChatOpened, &mut model);

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Community,
            text: "Has anyone walked through the park at night?".into(),
        },
        &mut model,
    );
    let (timer, delay_ms) = oneshot_timer(&update.effects);
    assert_eq!(delay_ms, 1_500);
    assert_eq!(model.community_chat.last().unwrap().sender, "Maya");

    app.update(
        Event::ChatReplyDue {
            channel: ChatChannel::Community,
            timer,
        },
        &mut model,
    );

    let reply = model.community_chat.last().unwrap();
    assert!(COMMUNITY_ROSTER.contains(&reply.sender.as_str()));
    assert!(COMMUNITY_REPLIES.contains(&reply.body.as_str()));
    assert!(!reply.from_me);
}

#[test]
fn logout_clears_the_community_and_cancels_pending_replies() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    log_in(&app, &mut model);
    app.update(Event::CommunityChatOpened, &mut model);

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Community,
            text: "hello".into(),
        },
        &mut model,
    );
    let (timer, _) = oneshot_timer(&update.effects);

    let logout = app.update(Event::LogoutRequested, &mut model);
    assert!(model.community_chat.is_empty());
    assert!(timer_ops(&logout.effects)
        .iter()
        .any(|op| matches!(op, TimerOperation::Cancel { id } if *id == timer)));

    // The logged-out tombstone is an empty value under the session key.
    let tombstone = logout.effects.iter().any(|effect| {
        matches!(
            effect,
            Effect::KeyValue(request)
                if matches!(
                    &request.operation,
                    KeyValueOperation::Write(key, value) if key == "user" && value.is_empty()
                )
        )
    });
    assert!(tombstone);

    // The cancelled reply never lands anywhere.
    app.update(
        Event::ChatReplyDue {
            channel: ChatChannel::Community,
            timer,
        },
        &mut model,
    );
    assert!(model.community_chat.is_empty());
}

#[test]
fn support_replies_survive_logout() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    log_in(&app, &mut model);

    let update = app.update(
        Event::ChatMessageSent {
            channel: ChatChannel::Support,
            text: "hello".into(),
        },
        &mut model,
    );
    let (timer, _) = oneshot_timer(&update.effects);

    app.update(Event::LogoutRequested, &mut model);
    app.update(
        Event::ChatReplyDue {
            channel: ChatChannel::Support,
            timer,
        },
        &mut model,
    );

    assert_eq!(model.support_chat.len(), 2);
}
