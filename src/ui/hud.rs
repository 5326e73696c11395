use std::cell::RefCell;
use std::rc::Rc;

use gettextrs::gettext;
use gtk4::prelude::*;

use super::state::AppState;

pub(super) fn format_mm_ss(total_secs: u32) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}", mins, secs)
}

pub(super) fn best_label(best_moves: Option<u32>) -> String {
    match best_moves {
        Some(best) => best.to_string(),
        None => "—".to_string(),
    }
}

pub(super) fn set_header_menu(state: &Rc<RefCell<AppState>>) {
    let st = state.borrow();
    if let (Some(header), Some(title)) = (&st.header, &st.title_menu) {
        header.set_title_widget(Some(title));
    }
    if let Some(back) = &st.back_button {
        back.set_visible(false);
    }
    if let Some(restart) = &st.restart_button {
        restart.set_visible(false);
    }
}

pub(super) fn set_header_game(state: &Rc<RefCell<AppState>>) {
    let st = state.borrow();
    if let (Some(header), Some(title_box)) = (&st.header, &st.title_game) {
        update_subtitle(&st);
        header.set_title_widget(Some(title_box));
    }
    if let Some(back) = &st.back_button {
        back.set_visible(true);
    }
    if let Some(restart) = &st.restart_button {
        restart.set_visible(true);
    }
}

pub(super) fn set_header_victory(state: &Rc<RefCell<AppState>>) {
    let st = state.borrow();
    if let (Some(header), Some(title)) = (&st.header, &st.title_victory) {
        header.set_title_widget(Some(title));
    }
    if let Some(back) = &st.back_button {
        back.set_visible(true);
    }
    if let Some(restart) = &st.restart_button {
        restart.set_visible(false);
    }
}

/// Header line shown while playing: moves, clock and personal best.
pub(super) fn update_subtitle(st: &AppState) {
    if let Some(subtitle) = &st.title_game_subtitle {
        let session = st.game.session();
        subtitle.set_text(&format!(
            "{} {} | {} | {} {}",
            gettext("Moves"),
            session.moves(),
            format_mm_ss(session.elapsed_secs()),
            gettext("Best"),
            best_label(session.best_moves()),
        ));
    }
}

pub(super) fn refresh_menu_best(st: &AppState) {
    let Some(label) = &st.menu_best_label else {
        return;
    };
    match st.game.session().best_moves() {
        Some(best) => {
            label.set_text(&format!("{}: {} {}", gettext("Personal best"), best, gettext("moves")));
            label.set_visible(true);
        }
        None => label.set_visible(false),
    }
}

pub(super) fn refresh_victory(st: &AppState) {
    let Some(summary) = st.last_summary else {
        return;
    };
    if let Some(label) = &st.victory_stats_label {
        label.set_text(&format!(
            "{}: {}\n{}: {}\n{}: {}",
            gettext("Moves"),
            summary.moves,
            gettext("Time"),
            format_mm_ss(summary.elapsed_secs),
            gettext("Best"),
            summary.best_moves,
        ));
    }
    if let Some(label) = &st.victory_record_label {
        label.set_visible(summary.new_record);
    }
}
