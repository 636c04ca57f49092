use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui::{self, FontData, FontDefinitions, FontFamily};

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{panels, tabs};

/// System fonts with CJK glyphs, tried in order when none is configured.
const SYSTEM_CJK_FONTS: [&str; 6] = [
    "C:\\Windows\\Fonts\\msjh.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
];

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct MotoDashApp {
    pub state: AppState,
}

impl MotoDashApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut state = AppState::new(config);
        if let Err(msg) = install_cjk_font(&cc.egui_ctx, state.config.cjk_font_path.as_deref()) {
            log::warn!("{msg}");
            state.status_message = Some(msg);
        }
        state.load_snapshot();
        Self { state }
    }
}

impl eframe::App for MotoDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // A load failure ends the session: nothing but the error is shown.
        if let Some(err) = &self.state.fatal {
            let message = err.to_string();
            egui::CentralPanel::default().show(ctx, |ui| {
                tabs::fatal_screen(ui, &message);
            });
            return;
        }

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            tabs::central_panel(ui, &mut self.state);
        });
    }
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// Add a CJK-capable font as fallback for both font families.
fn install_cjk_font(ctx: &egui::Context, configured: Option<&Path>) -> Result<(), String> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => SYSTEM_CJK_FONTS.iter().map(PathBuf::from).collect(),
    };

    let Some((path, bytes)) = candidates
        .iter()
        .find_map(|p| std::fs::read(p).ok().map(|bytes| (p, bytes)))
    else {
        return Err("未找到中文字型，中文可能無法顯示 (set cjk_font_path)".to_string());
    };

    log::info!("Using CJK font {}", path.display());
    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".to_owned(), Arc::new(FontData::from_owned(bytes)));
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push("cjk".to_owned());
    }
    ctx.set_fonts(fonts);
    Ok(())
}
