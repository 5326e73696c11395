use gtk4 as gtk;
use libadwaita as adw;

use pairs::{FinishSummary, Game};

pub struct AppState {
    pub view_stack: Option<gtk::Stack>,
    pub header: Option<adw::HeaderBar>,
    pub back_button: Option<gtk::Button>,
    pub restart_button: Option<gtk::Button>,
    pub title_menu: Option<gtk::Label>,
    pub title_game: Option<gtk::Widget>,
    pub title_game_subtitle: Option<gtk::Label>,
    pub title_victory: Option<gtk::Widget>,
    pub menu_best_label: Option<gtk::Label>,
    pub victory_stats_label: Option<gtk::Label>,
    pub victory_record_label: Option<gtk::Label>,
    pub board_container: Option<gtk::Box>,
    pub dynamic_css_provider: Option<gtk::CssProvider>,

    pub grid_buttons: Vec<gtk::Button>,
    pub flip_anim_phase: bool,
    pub last_summary: Option<FinishSummary>,
    pub game: Game,
}

impl AppState {
    pub fn new(game: Game) -> Self {
        AppState {
            view_stack: None,
            header: None,
            back_button: None,
            restart_button: None,
            title_menu: None,
            title_game: None,
            title_game_subtitle: None,
            title_victory: None,
            menu_best_label: None,
            victory_stats_label: None,
            victory_record_label: None,
            board_container: None,
            dynamic_css_provider: None,
            grid_buttons: Vec::new(),
            flip_anim_phase: false,
            last_summary: None,
            game,
        }
    }

    pub fn visible_view_is(&self, name: &str) -> bool {
        self.view_stack
            .as_ref()
            .and_then(|stack| stack.visible_child_name())
            .as_deref()
            == Some(name)
    }
}
