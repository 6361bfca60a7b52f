use trumpet_core::session::{
    ItemKind, PlayerPhase, PracticeSession, Section, SessionItem, SessionLibrary, SessionPlayer,
};

fn video(id: &str, order_index: u32) -> SessionItem {
    SessionItem {
        id: id.into(),
        title: format!("Video {id}"),
        order_index,
        kind: ItemKind::VimeoVideo {
            video_ref: format!("vimeo-{id}"),
        },
    }
}

fn pdf(id: &str, order_index: u32, seconds: Option<u32>) -> SessionItem {
    SessionItem {
        id: id.into(),
        title: format!("Sheet {id}"),
        order_index,
        kind: ItemKind::Pdf {
            pdf_ref: format!("{id}.pdf"),
            duration_seconds: seconds,
        },
    }
}

fn pause(id: &str, order_index: u32, seconds: Option<u32>) -> SessionItem {
    SessionItem {
        id: id.into(),
        title: String::new(),
        order_index,
        kind: ItemKind::Pause {
            duration_seconds: seconds,
        },
    }
}

fn section(title: &str, order_index: u32, items: Vec<SessionItem>) -> Section {
    Section {
        title: title.into(),
        order_index,
        items,
    }
}

fn session(break_enabled: bool, break_seconds: Option<u32>, sections: Vec<Section>) -> PracticeSession {
    PracticeSession {
        id: "daily".into(),
        name: "Daily routine".into(),
        share_slug: Some("daily".into()),
        is_public: true,
        break_enabled,
        break_seconds,
        sections,
    }
}

fn ids(player: &SessionPlayer) -> Vec<String> {
    player.queue().iter().map(|e| e.item.id.clone()).collect()
}

fn current_id(player: &SessionPlayer) -> Option<String> {
    player.current().map(|e| e.item.id.clone())
}

/// Delivers `n` ticks to whatever countdown is active.
fn tick(player: &mut SessionPlayer, n: u32) {
    for _ in 0..n {
        if let Some(id) = player.active_timer() {
            player.on_timer_tick(id);
        }
    }
}

#[test]
fn sections_flatten_into_one_queue() {
    let s = session(
        false,
        None,
        vec![
            section("Technique", 1, vec![video("item3", 0)]),
            section("Warm-up", 0, vec![video("item2", 1), video("item1", 0)]),
        ],
    );
    let mut player = SessionPlayer::new(&s);
    assert_eq!(ids(&player), vec!["item1", "item2", "item3"]);
    assert_eq!(player.queue()[2].section_title, "Technique");
    assert_eq!(current_id(&player).as_deref(), Some("item1"));
    assert_eq!(player.progress(), (1, 3));

    player.jump_to(2);
    assert_eq!(current_id(&player).as_deref(), Some("item3"));
    assert_eq!(player.progress(), (3, 3));

    player.jump_to(7);
    assert_eq!(player.current_index(), 2);
}

#[test]
fn video_end_advances_without_a_break() {
    let s = session(false, None, vec![section("A", 0, vec![video("v1", 0), video("v2", 1)])]);
    let mut player = SessionPlayer::new(&s);
    assert!(player.countdown().is_none());
    player.video_ended();
    assert_eq!(current_id(&player).as_deref(), Some("v2"));
    player.video_ended();
    assert!(player.is_finished());
}

#[test]
fn break_runs_between_items_and_can_be_extended() {
    let s = session(true, Some(20), vec![section("A", 0, vec![video("v1", 0), video("v2", 1)])]);
    let mut player = SessionPlayer::new(&s);
    player.video_ended();
    assert_eq!(player.phase(), PlayerPhase::AutoPause { next_index: 1 });
    assert_eq!(player.upcoming().map(|e| e.item.id.as_str()), Some("v2"));

    tick(&mut player, 5);
    player.extend();
    let countdown = player.countdown().unwrap();
    assert_eq!(countdown.elapsed(), 5);
    assert_eq!(countdown.total(), 50);
    assert_eq!(countdown.remaining(), 45);

    tick(&mut player, 45);
    assert_eq!(player.phase(), PlayerPhase::Playing);
    assert_eq!(current_id(&player).as_deref(), Some("v2"));
}

#[test]
fn skipping_the_break_starts_the_next_item() {
    let s = session(true, None, vec![section("A", 0, vec![video("v1", 0), video("v2", 1)])]);
    let mut player = SessionPlayer::new(&s);
    player.go_next();
    assert_eq!(player.countdown().unwrap().total(), 30);
    player.skip_break();
    assert_eq!(current_id(&player).as_deref(), Some("v2"));
    assert!(player.countdown().is_none());
}

#[test]
fn breaks_also_surround_authored_pauses() {
    let s = session(
        true,
        None,
        vec![section(
            "A",
            0,
            vec![video("v1", 0), pause("rest", 1, Some(10)), video("v2", 2)],
        )],
    );
    let mut player = SessionPlayer::new(&s);
    player.video_ended();
    assert_eq!(player.phase(), PlayerPhase::AutoPause { next_index: 1 });

    player.skip_break();
    assert_eq!(current_id(&player).as_deref(), Some("rest"));

    tick(&mut player, 10);
    assert_eq!(player.phase(), PlayerPhase::AutoPause { next_index: 2 });
    player.skip_break();
    assert_eq!(current_id(&player).as_deref(), Some("v2"));
}

#[test]
fn pause_items_count_down_and_extend() {
    let s = session(false, None, vec![section("A", 0, vec![pause("rest", 0, None), video("v", 1)])]);
    let mut player = SessionPlayer::new(&s);
    let countdown = player.countdown().unwrap();
    assert!(countdown.is_running());
    assert_eq!(countdown.remaining(), 60);

    tick(&mut player, 10);
    player.extend();
    assert_eq!(player.countdown().unwrap().remaining(), 80);
    assert_eq!(player.countdown().unwrap().elapsed(), 10);
}

#[test]
fn sheet_music_needs_a_manual_start() {
    let s = session(false, None, vec![section("A", 0, vec![pdf("etude", 0, Some(3)), video("v", 1)])]);
    let mut player = SessionPlayer::new(&s);
    assert_eq!(player.active_timer(), None);
    player.extend();
    assert_eq!(player.countdown().unwrap().total(), 3);

    player.toggle_pdf_timer();
    tick(&mut player, 3);
    assert_eq!(current_id(&player).as_deref(), Some("v"));
}

#[test]
fn ticks_from_a_left_countdown_are_ignored() {
    let s = session(
        false,
        None,
        vec![section("A", 0, vec![pause("p1", 0, Some(5)), pause("p2", 1, Some(5))])],
    );
    let mut player = SessionPlayer::new(&s);
    let stale = player.active_timer().unwrap();
    player.go_next();
    assert_eq!(current_id(&player).as_deref(), Some("p2"));

    player.on_timer_tick(stale);
    assert_eq!(player.countdown().unwrap().remaining(), 5);

    let fresh = player.active_timer().unwrap();
    assert_ne!(fresh, stale);
    player.on_timer_tick(fresh);
    assert_eq!(player.countdown().unwrap().remaining(), 4);
}

#[test]
fn navigation_moves_through_the_queue() {
    let s = session(
        true,
        None,
        vec![section("A", 0, vec![video("a", 0), video("b", 1), video("c", 2)])],
    );
    let mut player = SessionPlayer::new(&s);

    player.go_prev();
    assert_eq!(current_id(&player).as_deref(), Some("a"));

    player.go_next();
    assert!(matches!(player.phase(), PlayerPhase::AutoPause { next_index: 1 }));
    player.go_prev();
    assert_eq!(current_id(&player).as_deref(), Some("a"));
    assert_eq!(player.phase(), PlayerPhase::Playing);

    player.jump_to(1);
    player.replay();
    assert_eq!(current_id(&player).as_deref(), Some("b"));
}

#[test]
fn finished_session_can_restart() {
    let s = session(false, None, vec![section("A", 0, vec![video("a", 0), video("b", 1)])]);
    let mut player = SessionPlayer::new(&s);
    player.video_ended();
    player.video_ended();
    assert!(player.is_finished());
    assert!(player.current().is_none());
    assert_eq!(player.progress(), (2, 2));

    // Events for the old item do nothing now.
    player.video_ended();
    player.replay();
    assert!(player.is_finished());

    player.go_prev();
    assert_eq!(current_id(&player).as_deref(), Some("b"));

    player.restart();
    assert_eq!(current_id(&player).as_deref(), Some("a"));
}

#[test]
fn shared_sessions_open_by_slug() {
    let library = SessionLibrary::new(vec![session(
        false,
        None,
        vec![section("A", 0, vec![video("a", 0)])],
    )]);
    let s = library.find_by_share_slug("daily").unwrap();
    let player = SessionPlayer::new(s);
    assert_eq!(player.session_name(), "Daily routine");
    assert_eq!(player.queue().len(), 1);
}
