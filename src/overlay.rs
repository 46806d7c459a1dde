use crate::app_log;
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_POSITION: (f64, f64) = (50.0, 50.0);
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";
pub const DEFAULT_FONT_SIZE: u32 = 24;

/// A text annotation. `x` and `y` are percentages of the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub font_size: u32,
}

/// A sticker annotation. `x` and `y` are percentages of the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerOverlay {
    pub id: String,
    pub symbol: String,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Degrees
    pub rotation: f64,
}

/// Text and sticker collections for one editing session.
///
/// Both collections keep insertion order, which is also paint order: later
/// entries draw above earlier ones.
#[derive(Debug, Clone, Default)]
pub struct OverlayManager {
    texts: Vec<TextOverlay>,
    stickers: Vec<StickerOverlay>,
    pending_text: String,
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_POSITION.0;
    }
    value.clamp(0.0, 100.0)
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from previously captured collections
    pub fn from_parts(texts: Vec<TextOverlay>, stickers: Vec<StickerOverlay>) -> Self {
        Self {
            texts,
            stickers,
            pending_text: String::new(),
        }
    }

    /// Append a text overlay at the default position.
    ///
    /// Blank content is ignored. Returns the new id. Clears the draft buffer.
    pub fn add_text(&mut self, content: &str) -> Option<String> {
        if content.trim().is_empty() {
            return None;
        }

        let id = Uuid::new_v4().to_string();
        self.texts.push(TextOverlay {
            id: id.clone(),
            text: content.to_string(),
            x: DEFAULT_POSITION.0,
            y: DEFAULT_POSITION.1,
            color: DEFAULT_TEXT_COLOR.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        });
        self.pending_text.clear();

        app_log!(LogLevel::Debug, "overlay", "Added text overlay {}", id);
        Some(id)
    }

    pub fn set_pending_text(&mut self, draft: impl Into<String>) {
        self.pending_text = draft.into();
    }

    pub fn pending_text(&self) -> &str {
        &self.pending_text
    }

    /// Add the draft buffer as a text overlay
    pub fn commit_pending_text(&mut self) -> Option<String> {
        let draft = std::mem::take(&mut self.pending_text);
        let id = self.add_text(&draft);
        if id.is_none() {
            self.pending_text = draft;
        }
        id
    }

    /// Returns false if no overlay has this id
    pub fn remove_text(&mut self, id: &str) -> bool {
        let before = self.texts.len();
        self.texts.retain(|t| t.id != id);
        before != self.texts.len()
    }

    pub fn update_text_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.texts.iter_mut().find(|t| t.id == id) {
            Some(text) => {
                text.x = clamp_percent(x);
                text.y = clamp_percent(y);
                true
            }
            None => false,
        }
    }

    pub fn update_text_style(
        &mut self,
        id: &str,
        color: Option<&str>,
        font_size: Option<u32>,
    ) -> bool {
        let Some(text) = self.texts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if let Some(color) = color {
            text.color = color.to_string();
        }
        if let Some(size) = font_size {
            text.font_size = size.max(1);
        }
        true
    }

    /// Append a sticker at the default position with scale 1 and no rotation
    pub fn add_sticker(&mut self, symbol: &str) -> Option<String> {
        if symbol.trim().is_empty() {
            return None;
        }

        let id = Uuid::new_v4().to_string();
        self.stickers.push(StickerOverlay {
            id: id.clone(),
            symbol: symbol.to_string(),
            x: DEFAULT_POSITION.0,
            y: DEFAULT_POSITION.1,
            scale: 1.0,
            rotation: 0.0,
        });

        app_log!(LogLevel::Debug, "overlay", "Added sticker overlay {}", id);
        Some(id)
    }

    /// Returns false if no sticker has this id
    pub fn remove_sticker(&mut self, id: &str) -> bool {
        let before = self.stickers.len();
        self.stickers.retain(|s| s.id != id);
        before != self.stickers.len()
    }

    pub fn update_sticker_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.stickers.iter_mut().find(|s| s.id == id) {
            Some(sticker) => {
                sticker.x = clamp_percent(x);
                sticker.y = clamp_percent(y);
                true
            }
            None => false,
        }
    }

    pub fn update_sticker_transform(&mut self, id: &str, scale: f64, rotation: f64) -> bool {
        let Some(sticker) = self.stickers.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if scale.is_finite() && scale > 0.0 {
            sticker.scale = scale;
        }
        if rotation.is_finite() {
            sticker.rotation = rotation % 360.0;
        }
        true
    }

    pub fn texts(&self) -> &[TextOverlay] {
        &self.texts
    }

    pub fn stickers(&self) -> &[StickerOverlay] {
        &self.stickers
    }

    pub fn text(&self, id: &str) -> Option<&TextOverlay> {
        self.texts.iter().find(|t| t.id == id)
    }

    pub fn sticker(&self, id: &str) -> Option<&StickerOverlay> {
        self.stickers.iter().find(|s| s.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.stickers.is_empty()
    }

    /// Replace both collections, keeping the draft buffer
    pub fn restore(&mut self, texts: Vec<TextOverlay>, stickers: Vec<StickerOverlay>) {
        self.texts = texts;
        self.stickers = stickers;
    }

    pub fn clear(&mut self) {
        self.texts.clear();
        self.stickers.clear();
        self.pending_text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_ignored() {
        let mut overlays = OverlayManager::new();
        assert!(overlays.add_text("").is_none());
        assert!(overlays.add_text("   ").is_none());
        assert!(overlays.texts().is_empty());
    }

    #[test]
    fn test_add_text_defaults() {
        let mut overlays = OverlayManager::new();
        let id = overlays.add_text("hi").unwrap();

        assert_eq!(overlays.texts().len(), 1);
        let text = overlays.text(&id).unwrap();
        assert_eq!((text.x, text.y), (50.0, 50.0));
        assert_eq!(text.color, "#FFFFFF");
        assert_eq!(text.font_size, 24);
    }

    #[test]
    fn test_remove_unknown_id_leaves_collections() {
        let mut overlays = OverlayManager::new();
        overlays.add_text("one");
        overlays.add_sticker("⭐");
        let texts = overlays.texts().to_vec();
        let stickers = overlays.stickers().to_vec();

        assert!(!overlays.remove_text("missing"));
        assert!(!overlays.remove_sticker("missing"));
        assert_eq!(overlays.texts(), texts.as_slice());
        assert_eq!(overlays.stickers(), stickers.as_slice());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut overlays = OverlayManager::new();
        overlays.add_text("first");
        let middle = overlays.add_text("second").unwrap();
        overlays.add_text("third");
        overlays.remove_text(&middle);

        let order: Vec<_> = overlays.texts().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(order, vec!["first", "third"]);
    }

    #[test]
    fn test_sticker_defaults_and_transform() {
        let mut overlays = OverlayManager::new();
        let id = overlays.add_sticker("🔥").unwrap();
        let sticker = overlays.sticker(&id).unwrap();
        assert_eq!(sticker.scale, 1.0);
        assert_eq!(sticker.rotation, 0.0);

        assert!(overlays.update_sticker_transform(&id, 2.5, 450.0));
        let sticker = overlays.sticker(&id).unwrap();
        assert_eq!(sticker.scale, 2.5);
        assert_eq!(sticker.rotation, 90.0);

        // Non-positive scale is rejected
        overlays.update_sticker_transform(&id, 0.0, 90.0);
        assert_eq!(overlays.sticker(&id).unwrap().scale, 2.5);
    }

    #[test]
    fn test_positions_clamped_to_percent() {
        let mut overlays = OverlayManager::new();
        let text = overlays.add_text("x").unwrap();
        let sticker = overlays.add_sticker("x").unwrap();

        overlays.update_text_position(&text, 120.0, -5.0);
        overlays.update_sticker_position(&sticker, 33.3, 101.0);

        let t = overlays.text(&text).unwrap();
        assert_eq!((t.x, t.y), (100.0, 0.0));
        let s = overlays.sticker(&sticker).unwrap();
        assert_eq!((s.x, s.y), (33.3, 100.0));
        assert!(!overlays.update_text_position("missing", 1.0, 1.0));
    }

    #[test]
    fn test_pending_text_commit() {
        let mut overlays = OverlayManager::new();
        overlays.set_pending_text("  ");
        assert!(overlays.commit_pending_text().is_none());
        assert_eq!(overlays.pending_text(), "  ");

        overlays.set_pending_text("caption");
        assert!(overlays.commit_pending_text().is_some());
        assert_eq!(overlays.pending_text(), "");
        assert_eq!(overlays.texts()[0].text, "caption");
    }

    #[test]
    fn test_add_text_clears_draft() {
        let mut overlays = OverlayManager::new();
        overlays.set_pending_text("draft");
        overlays.add_text("other");
        assert_eq!(overlays.pending_text(), "");
    }

    #[test]
    fn test_style_update() {
        let mut overlays = OverlayManager::new();
        let id = overlays.add_text("styled").unwrap();
        assert!(overlays.update_text_style(&id, Some("#FF0000"), None));
        assert!(overlays.update_text_style(&id, None, Some(48)));

        let text = overlays.text(&id).unwrap();
        assert_eq!(text.color, "#FF0000");
        assert_eq!(text.font_size, 48);
    }

    #[test]
    fn test_overlay_serializes_camel_case() {
        let mut overlays = OverlayManager::new();
        overlays.add_text("json");
        let value = serde_json::to_value(&overlays.texts()[0]).unwrap();
        assert_eq!(value["fontSize"], 24);
    }
}
