use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use adw::prelude::*;
use gettextrs::gettext;
use gio::SimpleAction;
use gtk4 as gtk;
use gtk4::gdk;
use gtk4::prelude::*;
use libadwaita as adw;
use pairs::config::CONFIG_FILE_NAME;
use pairs::game::PairOutcome;
use pairs::{CardId, Command, Game, GameConfig, GameEvent, JsonFileStore, Phase};
use tracing::{error, info, warn};

use super::board::{CONTENT_MARGIN, mark_matched, mark_mismatch, play_flip_hide, play_flip_show};
use super::dialogs::{show_about_dialog, show_instructions_dialog};
use super::hud::{refresh_menu_best, set_header_menu, update_subtitle};
use super::scene::{show_game, show_menu, show_victory};
use super::state::AppState;
use super::timers::{DispatchSlot, GlibScheduler};

pub const APP_ID: &str = "io.github.pairs.Pairs";

const STYLE_CSS: &str = include_str!("../../data/style.css");
const VICTORY_DELAY_MS: u64 = 700;

/// Single entry point for every state change coming from the window or from
/// a fired timer.
pub(super) fn dispatch(state: &Rc<RefCell<AppState>>, command: Command) {
    let result = state.borrow_mut().game.update(command);
    match result {
        Ok(events) => apply_events(state, events),
        Err(err) => error!(%err, "command rejected"),
    }
}

pub(super) fn handle_card_click(state: &Rc<RefCell<AppState>>, id: CardId) {
    dispatch(state, Command::Select(id));
}

fn apply_events(state: &Rc<RefCell<AppState>>, events: Vec<GameEvent>) {
    for event in events {
        match event {
            GameEvent::Started { .. } => show_game(state),
            GameEvent::CardFlipped(id) => play_flip_show(&mut state.borrow_mut(), id),
            GameEvent::PairSelected {
                first,
                second,
                outcome: PairOutcome::Mismatch,
            } => mark_mismatch(&state.borrow(), [first, second]),
            GameEvent::PairSelected { .. } => (),
            GameEvent::PairMatched { first, second } => {
                mark_matched(&state.borrow(), [first, second]);
            }
            GameEvent::PairHidden { first, second } => {
                let st = state.borrow();
                play_flip_hide(&st, first);
                play_flip_hide(&st, second);
            }
            GameEvent::Ticked { .. } => (),
            GameEvent::Finished(summary) => {
                state.borrow_mut().last_summary = Some(summary);
                schedule_victory(state);
            }
            GameEvent::Reset => {
                let mut st = state.borrow_mut();
                st.last_summary = None;
                if let Some(container) = &st.board_container {
                    container.remove_css_class("victory-pending");
                }
            }
        }
    }
    update_subtitle(&state.borrow());
}

/// Lets the last pair's animation play before leaving the board.
fn schedule_victory(state: &Rc<RefCell<AppState>>) {
    let generation = {
        let st = state.borrow();
        if let Some(container) = &st.board_container {
            container.add_css_class("victory-pending");
        }
        st.game.generation()
    };
    let state_victory = Rc::downgrade(state);
    glib::timeout_add_local_once(Duration::from_millis(VICTORY_DELAY_MS), move || {
        let Some(state) = state_victory.upgrade() else {
            return;
        };
        {
            let st = state.borrow();
            if st.game.generation() != generation || st.game.phase() != Phase::Finished {
                return;
            }
        }
        show_victory(&state);
    });
}

fn start_new_game(state: &Rc<RefCell<AppState>>) {
    if state.borrow().game.phase() == Phase::InProgress {
        dispatch(state, Command::Reset);
    }
    dispatch(state, Command::Start);
}

fn back_to_menu(state: &Rc<RefCell<AppState>>) {
    dispatch(state, Command::Reset);
    show_menu(state);
}

fn build_game(dispatch_slot: &DispatchSlot) -> Option<Game> {
    let data_dir = glib::user_config_dir().join("pairs");
    let config = GameConfig::load_or_default(&data_dir.join(CONFIG_FILE_NAME));
    let store = JsonFileStore::in_dir(&data_dir);
    info!(records = %store.path().display(), ?config, "loading game");

    let game = Game::new(
        config,
        Box::new(store.clone()),
        Box::new(GlibScheduler::new(dispatch_slot.clone())),
    )
    .or_else(|err| {
        warn!(%err, "board configuration rejected, using defaults");
        Game::new(
            GameConfig::default(),
            Box::new(store),
            Box::new(GlibScheduler::new(dispatch_slot.clone())),
        )
    });
    match game {
        Ok(game) => Some(game),
        Err(err) => {
            error!(%err, "cannot set up a board");
            None
        }
    }
}

pub fn run() -> glib::ExitCode {
    glib::set_prgname(Some(APP_ID));
    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(move |app| {
        load_css();

        let dispatch_slot = DispatchSlot::default();
        let Some(game) = build_game(&dispatch_slot) else {
            app.quit();
            return;
        };
        let state = Rc::new(RefCell::new(AppState::new(game)));
        dispatch_slot.set(Rc::new({
            let state = Rc::downgrade(&state);
            move |command| {
                if let Some(state) = state.upgrade() {
                    dispatch(&state, command);
                }
            }
        }));

        let instructions_action = SimpleAction::new("instructions", None);
        instructions_action.connect_activate({
            let app = app.clone();
            move |_, _| {
                show_instructions_dialog(&app);
            }
        });
        app.add_action(&instructions_action);

        let about_action = SimpleAction::new("about", None);
        about_action.connect_activate({
            let app = app.clone();
            move |_, _| {
                show_about_dialog(&app);
            }
        });
        app.add_action(&about_action);

        let quit_action = SimpleAction::new("quit", None);
        quit_action.connect_activate({
            let app = app.clone();
            move |_, _| app.quit()
        });
        app.add_action(&quit_action);
        app.set_accels_for_action("app.quit", &["<Primary>q"]);

        let dynamic_css_provider = gtk::CssProvider::new();
        if let Some(display) = gdk::Display::default() {
            gtk::style_context_add_provider_for_display(
                &display,
                &dynamic_css_provider,
                gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
        }

        let title_menu = gtk::Label::new(None);
        title_menu.set_markup("<b>Pairs</b>");
        title_menu.set_halign(gtk::Align::Center);

        let title_game_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
        title_game_box.set_valign(gtk::Align::Center);
        title_game_box.set_halign(gtk::Align::Center);
        title_game_box.set_hexpand(true);

        let title_game_main = gtk::Label::builder()
            .label("Pairs")
            .halign(gtk::Align::Center)
            .css_classes(vec!["game-title-main"])
            .build();
        let title_game_subtitle = gtk::Label::builder()
            .label("")
            .halign(gtk::Align::Center)
            .css_classes(vec!["game-title-subtitle", "caption", "numeric"])
            .build();
        title_game_box.append(&title_game_main);
        title_game_box.append(&title_game_subtitle);

        let title_victory_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
        title_victory_box.set_valign(gtk::Align::Center);
        title_victory_box.set_halign(gtk::Align::Center);
        let title_victory_main = gtk::Label::new(Some("Pairs"));
        title_victory_main.add_css_class("game-title-main");
        let title_victory_sub = gtk::Label::new(Some(&gettext("Victory")));
        title_victory_sub.add_css_class("game-title-subtitle");
        title_victory_sub.add_css_class("caption");
        title_victory_box.append(&title_victory_main);
        title_victory_box.append(&title_victory_sub);

        let header = adw::HeaderBar::builder().title_widget(&title_menu).build();
        header.add_css_class("app-header");
        header.add_css_class("flat");

        let back_button = gtk::Button::builder()
            .icon_name("go-previous-symbolic")
            .build();
        back_button.set_tooltip_text(Some(&gettext("Back")));
        back_button.connect_clicked({
            let state = state.clone();
            move |_| back_to_menu(&state)
        });
        header.pack_start(&back_button);

        let menu_model = gio::Menu::new();
        menu_model.append(Some(&gettext("Instructions")), Some("app.instructions"));
        menu_model.append(Some(&gettext("About Pairs")), Some("app.about"));
        menu_model.append(Some(&gettext("Quit")), Some("app.quit"));
        let menu_button = gtk::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .menu_model(&menu_model)
            .build();

        let restart_button = gtk::Button::builder()
            .icon_name("view-refresh-symbolic")
            .build();
        restart_button.set_tooltip_text(Some(&gettext("New Game")));
        restart_button.connect_clicked({
            let state = state.clone();
            move |_| start_new_game(&state)
        });
        let end_box = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        end_box.append(&restart_button);
        end_box.append(&menu_button);
        header.pack_end(&end_box);

        let view_stack = gtk::Stack::new();
        view_stack.set_hexpand(true);
        view_stack.set_vexpand(true);
        view_stack.set_hhomogeneous(false);
        view_stack.set_vhomogeneous(false);
        view_stack.set_interpolate_size(false);
        view_stack.set_transition_type(gtk::StackTransitionType::SlideLeft);
        view_stack.set_transition_duration(300);

        let game_view = build_game_view(&state);
        view_stack.add_named(&game_view, Some("game"));
        let victory_view = build_victory_view(&state);
        view_stack.add_named(&victory_view, Some("victory"));
        let menu_view = build_menu_view(&state);
        view_stack.add_named(&menu_view, Some("menu"));
        view_stack.set_visible_child_name("menu");

        let toolbar = adw::ToolbarView::new();
        toolbar.set_hexpand(true);
        toolbar.set_vexpand(true);
        toolbar.add_top_bar(&header);
        toolbar.set_content(Some(&view_stack));

        let win = adw::ApplicationWindow::builder()
            .application(app)
            .title("Pairs")
            .default_width(720)
            .default_height(760)
            .content(&toolbar)
            .build();
        win.set_size_request(360, 480);
        win.add_css_class("app-window");

        let style_manager = adw::StyleManager::default();
        if style_manager.is_dark() {
            win.add_css_class("theme-dark");
        } else {
            win.add_css_class("theme-light");
        }
        style_manager.connect_notify_local(Some("dark"), {
            let win = win.clone();
            move |manager, _| {
                if manager.is_dark() {
                    win.remove_css_class("theme-light");
                    win.add_css_class("theme-dark");
                } else {
                    win.remove_css_class("theme-dark");
                    win.add_css_class("theme-light");
                }
            }
        });

        {
            let mut st = state.borrow_mut();
            st.view_stack = Some(view_stack.clone());
            st.header = Some(header.clone());
            st.back_button = Some(back_button);
            st.restart_button = Some(restart_button);
            st.title_menu = Some(title_menu);
            st.title_game = Some(title_game_box.upcast::<gtk::Widget>());
            st.title_game_subtitle = Some(title_game_subtitle);
            st.title_victory = Some(title_victory_box.upcast::<gtk::Widget>());
            st.dynamic_css_provider = Some(dynamic_css_provider);
            refresh_menu_best(&st);
        }

        let global_key = gtk::EventControllerKey::new();
        global_key.set_propagation_phase(gtk::PropagationPhase::Capture);
        global_key.connect_key_pressed({
            let state = state.clone();
            move |_, key, _, _| {
                if key == gdk::Key::Escape && !state.borrow().visible_view_is("menu") {
                    back_to_menu(&state);
                    return glib::Propagation::Stop;
                }
                glib::Propagation::Proceed
            }
        });
        win.add_controller(global_key);

        set_header_menu(&state);
        win.present();
    });

    app.run()
}

fn load_css() {
    let Some(display) = gdk::Display::default() else {
        return;
    };
    let provider = gtk::CssProvider::new();
    provider.load_from_data(STYLE_CSS);
    gtk::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}

fn build_menu_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("main-menu-root");

    let center = gtk::CenterBox::new();
    center.set_hexpand(true);
    center.set_vexpand(true);

    let content = gtk::Box::new(gtk::Orientation::Vertical, 6);
    content.set_halign(gtk::Align::Center);
    content.set_valign(gtk::Align::Center);
    content.add_css_class("main-menu-content");

    let icon = gtk::Label::new(Some("🎴"));
    icon.add_css_class("main-menu-icon");

    let title = gtk::Label::new(Some("Pairs"));
    title.add_css_class("main-menu-title");
    title.add_css_class("title-1");

    let tagline = gtk::Label::new(Some(&gettext("Flip cards, find pairs, beat your best!")));
    tagline.add_css_class("dim-label");

    let best = gtk::Label::new(None);
    best.add_css_class("main-menu-best");
    best.add_css_class("heading");
    best.set_margin_top(12);
    best.set_visible(false);

    let start_button = gtk::Button::with_label(&gettext("Start Game"));
    start_button.add_css_class("main-menu-button");
    start_button.add_css_class("suggested-action");
    start_button.add_css_class("pill");
    start_button.set_size_request(164, 40);
    start_button.set_margin_top(18);
    start_button.set_halign(gtk::Align::Center);
    start_button.connect_clicked({
        let state = state.clone();
        move |_| start_new_game(&state)
    });

    content.append(&icon);
    content.append(&title);
    content.append(&tagline);
    content.append(&best);
    content.append(&start_button);

    center.set_center_widget(Some(&content));
    root.append(&center);

    state.borrow_mut().menu_best_label = Some(best);

    root
}

fn build_game_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("game-root");

    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_hexpand(true);
    content.set_vexpand(true);
    content.set_halign(gtk::Align::Fill);
    content.set_valign(gtk::Align::Fill);
    content.set_margin_top(CONTENT_MARGIN);
    content.set_margin_bottom(CONTENT_MARGIN);
    content.set_margin_start(CONTENT_MARGIN);
    content.set_margin_end(CONTENT_MARGIN);

    let board_frame = gtk::AspectFrame::new(0.5, 0.5, 1.0, false);
    board_frame.set_halign(gtk::Align::Fill);
    board_frame.set_valign(gtk::Align::Fill);
    board_frame.set_hexpand(true);
    board_frame.set_vexpand(true);

    let board_card = gtk::Box::new(gtk::Orientation::Vertical, 0);
    board_card.set_halign(gtk::Align::Fill);
    board_card.set_valign(gtk::Align::Fill);
    board_card.set_hexpand(true);
    board_card.set_vexpand(true);
    board_card.add_css_class("pairs-board-container");

    board_card.connect_closure(
        "notify::width",
        false,
        glib::closure_local!(move |card: gtk::Box, _: glib::ParamSpec| {
            if card.width() < 500 {
                card.add_css_class("compact");
            } else {
                card.remove_css_class("compact");
            }
        }),
    );

    board_frame.set_child(Some(&board_card));
    content.append(&board_frame);
    root.append(&content);

    state.borrow_mut().board_container = Some(board_card);

    root
}

fn build_victory_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("victory-root");

    let center = gtk::CenterBox::new();
    center.set_hexpand(true);
    center.set_vexpand(true);

    let card_shell = gtk::Box::new(gtk::Orientation::Vertical, 0);
    card_shell.set_halign(gtk::Align::Center);
    card_shell.set_valign(gtk::Align::Center);
    card_shell.add_css_class("victory-card");
    card_shell.set_size_request(280, 360);

    let content = gtk::Box::new(gtk::Orientation::Vertical, 14);
    content.set_halign(gtk::Align::Center);
    content.set_valign(gtk::Align::Center);
    content.set_margin_top(28);
    content.set_margin_bottom(28);
    content.set_margin_start(28);
    content.set_margin_end(28);

    let art = gtk::Label::new(Some("🎉"));
    art.add_css_class("victory-art");

    let title = gtk::Label::new(Some(&gettext("You Won!")));
    title.add_css_class("victory-title");
    title.add_css_class("title-1");

    let record = gtk::Label::new(Some(&gettext("New record!")));
    record.add_css_class("victory-record");
    record.add_css_class("accent");
    record.set_visible(false);

    let stats = gtk::Label::new(None);
    stats.add_css_class("victory-message");
    stats.add_css_class("body");
    stats.add_css_class("numeric");
    stats.set_justify(gtk::Justification::Center);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 12);
    buttons.set_halign(gtk::Align::Center);
    buttons.set_margin_top(6);

    let again_btn = gtk::Button::with_label(&gettext("Play Again"));
    again_btn.add_css_class("suggested-action");
    let menu_btn = gtk::Button::with_label(&gettext("Main Menu"));

    again_btn.connect_clicked({
        let state = state.clone();
        move |_| start_new_game(&state)
    });
    menu_btn.connect_clicked({
        let state = state.clone();
        move |_| back_to_menu(&state)
    });

    buttons.append(&again_btn);
    buttons.append(&menu_btn);

    content.append(&art);
    content.append(&title);
    content.append(&record);
    content.append(&stats);
    content.append(&buttons);
    card_shell.append(&content);
    center.set_center_widget(Some(&card_shell));
    root.append(&center);

    {
        let mut st = state.borrow_mut();
        st.victory_stats_label = Some(stats);
        st.victory_record_label = Some(record);
    }

    root
}
