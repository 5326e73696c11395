use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::pango;
use gtk4::prelude::*;
use pairs::{Card, CardId, CardStatus};

use super::app::handle_card_click;
use super::state::AppState;

pub const CONTENT_MARGIN: i32 = 12;
pub const CARD_GAP: i32 = 8;

const FLIP_CLASSES: [&str; 4] = ["flip-hide", "flip-show-a", "flip-show-b", "mismatch-shake"];

pub(super) fn clear_flip_classes(button: &gtk::Button) {
    for class in FLIP_CLASSES {
        button.remove_css_class(class);
    }
}

pub(super) fn redraw_button_child(button: &gtk::Button) {
    if let Some(child) = button.child() {
        child.queue_draw();
    }
}

/// Alternates between two identical keyframe classes so back-to-back flips
/// of the same card restart the animation.
pub(super) fn play_flip_show(st: &mut AppState, id: CardId) {
    let Some(button) = st.grid_buttons.get(id.index()).cloned() else {
        return;
    };
    clear_flip_classes(&button);
    st.flip_anim_phase = !st.flip_anim_phase;
    if st.flip_anim_phase {
        button.add_css_class("flip-show-a");
    } else {
        button.add_css_class("flip-show-b");
    }
    button.add_css_class("active");
    redraw_button_child(&button);
}

pub(super) fn play_flip_hide(st: &AppState, id: CardId) {
    if let Some(button) = st.grid_buttons.get(id.index()) {
        clear_flip_classes(button);
        button.remove_css_class("active");
        button.add_css_class("flip-hide");
        redraw_button_child(button);
    }
}

pub(super) fn mark_mismatch(st: &AppState, ids: [CardId; 2]) {
    for id in ids {
        if let Some(button) = st.grid_buttons.get(id.index()) {
            button.remove_css_class("mismatch-shake");
            button.add_css_class("mismatch-shake");
        }
    }
}

pub(super) fn mark_matched(st: &AppState, ids: [CardId; 2]) {
    for id in ids {
        if let Some(button) = st.grid_buttons.get(id.index()) {
            clear_flip_classes(button);
            button.remove_css_class("active");
            button.add_css_class("matched");
            redraw_button_child(button);
        }
    }
}

/// Brings every button's classes in line with the card it shows.
pub(super) fn sync_card_classes(st: &AppState) {
    let Some(board) = st.game.board() else {
        return;
    };
    for (button, card) in st.grid_buttons.iter().zip(board.cards()) {
        clear_flip_classes(button);
        button.remove_css_class("active");
        button.remove_css_class("matched");
        match card.status {
            CardStatus::Matched => button.add_css_class("matched"),
            CardStatus::FaceUp => button.add_css_class("active"),
            CardStatus::Hidden => (),
        }
        redraw_button_child(button);
    }
}

const EMOJI_FAMILY: &str = "Noto Color Emoji, Apple Color Emoji, Segoe UI Emoji, sans";
const BACK_FAMILY: &str = "Cantarell, Noto Sans, sans";

/// What one card shows: its symbol once turned, a question mark otherwise.
#[derive(Debug, PartialEq)]
struct CardFace<'a> {
    text: &'a str,
    /// Glyph size relative to the shorter side of the card.
    scale: f64,
    emoji: bool,
    alpha: f64,
}

impl<'a> CardFace<'a> {
    fn of(card: &'a Card) -> Self {
        match card.status {
            CardStatus::Hidden => CardFace {
                text: "?",
                scale: 0.34,
                emoji: false,
                alpha: 1.0,
            },
            CardStatus::FaceUp => CardFace {
                text: &card.symbol,
                scale: 0.46,
                emoji: true,
                alpha: 1.0,
            },
            CardStatus::Matched => CardFace {
                text: &card.symbol,
                scale: 0.40,
                emoji: true,
                alpha: 0.6,
            },
        }
    }

    fn font(&self, min_dim: f64) -> pango::FontDescription {
        let mut font = pango::FontDescription::new();
        if self.emoji {
            font.set_family(EMOJI_FAMILY);
        } else {
            font.set_family(BACK_FAMILY);
            font.set_weight(pango::Weight::Bold);
        }
        font.set_size((min_dim * self.scale * pango::SCALE as f64) as i32);
        font
    }
}

fn draw_card_face(
    area: &gtk::DrawingArea,
    cr: &cairo::Context,
    width: i32,
    height: i32,
    face: &CardFace<'_>,
) {
    cr.set_antialias(cairo::Antialias::Best);
    let layout = pangocairo::functions::create_layout(cr);
    layout.set_font_description(Some(&face.font(width.min(height) as f64)));
    layout.set_text(face.text);

    #[allow(deprecated)]
    let fg = area.style_context().color();
    cr.set_source_rgba(
        fg.red() as f64,
        fg.green() as f64,
        fg.blue() as f64,
        fg.alpha() as f64 * face.alpha,
    );

    let (text_width, text_height) = layout.pixel_size();
    cr.move_to(
        (width - text_width) as f64 / 2.0,
        (height - text_height) as f64 / 2.0,
    );
    pangocairo::functions::show_layout(cr, &layout);
}

pub fn build_board_grid(state: &Rc<RefCell<AppState>>) -> gtk::Grid {
    let grid = gtk::Grid::new();
    grid.add_css_class("pairs-board");
    grid.set_row_spacing(CARD_GAP as u32);
    grid.set_column_spacing(CARD_GAP as u32);
    grid.set_halign(gtk::Align::Fill);
    grid.set_valign(gtk::Align::Fill);
    grid.set_hexpand(true);
    grid.set_vexpand(true);

    let (css_provider, grid_cols, grid_rows) = {
        let st = state.borrow();
        let config = st.game.config();
        (
            st.dynamic_css_provider.clone(),
            config.grid_cols as i32,
            config.grid_rows as i32,
        )
    };

    let update_styles = move |grid: &gtk::Grid| {
        let width = grid.width();
        let height = grid.height();
        if width <= 0 || height <= 0 {
            return;
        }
        let cell_width = (width - (grid_cols - 1) * CARD_GAP) / grid_cols;
        let cell_height = (height - (grid_rows - 1) * CARD_GAP) / grid_rows;
        let card_radius = (cell_width.min(cell_height) as f64 * 0.15) as i32;
        if let Some(provider) = &css_provider {
            provider.load_from_data(&format!(
                ".pairs-card {{ border-radius: {card_radius}px; }}"
            ));
        }
    };

    let update_styles_height = update_styles.clone();
    grid.connect_closure(
        "notify::width",
        false,
        glib::closure_local!(move |grid: gtk::Grid, _: glib::ParamSpec| {
            update_styles(&grid);
        }),
    );
    grid.connect_closure(
        "notify::height",
        false,
        glib::closure_local!(move |grid: gtk::Grid, _: glib::ParamSpec| {
            update_styles_height(&grid);
        }),
    );

    let mut buttons = Vec::new();

    for i in 0..(grid_rows * grid_cols) {
        let id = CardId(i as usize);
        let aspect_frame = gtk::AspectFrame::builder()
            .ratio(1.0)
            .obey_child(false)
            .halign(gtk::Align::Fill)
            .valign(gtk::Align::Fill)
            .hexpand(true)
            .vexpand(true)
            .build();

        let button = gtk::Button::builder()
            .css_classes(vec!["pairs-card"])
            .hexpand(true)
            .vexpand(true)
            .build();

        let drawing_area = gtk::DrawingArea::builder()
            .hexpand(true)
            .vexpand(true)
            .build();
        drawing_area.add_css_class("pairs-card-face");

        let state_draw = state.clone();
        drawing_area.set_draw_func(move |area, cr, width, height| {
            let st = state_draw.borrow();
            if let Some(card) = st.game.board().and_then(|board| board.card(id)) {
                draw_card_face(area, cr, width, height, &CardFace::of(card));
            }
        });

        button.set_child(Some(&drawing_area));

        let state_click = state.clone();
        button.connect_clicked(move |_| {
            handle_card_click(&state_click, id);
        });

        aspect_frame.set_child(Some(&button));
        grid.attach(&aspect_frame, i % grid_cols, i / grid_cols, 1, 1);
        buttons.push(button);
    }

    let mut st = state.borrow_mut();
    st.grid_buttons = buttons;
    sync_card_classes(&st);
    drop(st);

    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(status: CardStatus) -> Card {
        let mut card = Card::new(CardId(0), "🐙");
        card.status = status;
        card
    }

    #[test]
    fn hidden_card_shows_question_mark() {
        let card = card(CardStatus::Hidden);
        let face = CardFace::of(&card);
        assert_eq!(face.text, "?");
        assert!(!face.emoji);
    }

    #[test]
    fn turned_cards_show_their_symbol() {
        let up = card(CardStatus::FaceUp);
        let matched = card(CardStatus::Matched);
        let up_face = CardFace::of(&up);
        let matched_face = CardFace::of(&matched);
        assert_eq!(up_face.text, "🐙");
        assert_eq!(matched_face.text, "🐙");
        assert!(matched_face.alpha < up_face.alpha);
        assert!(matched_face.scale < up_face.scale);
    }
}
