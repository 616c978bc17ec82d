use gallery::ViewerKey;
use winit::keyboard::{Key, NamedKey};

/// Maps a logical key to the viewer's key set. Keys the viewer never acts on
/// map to `None`.
pub fn viewer_key(key: &Key) -> Option<ViewerKey> {
    match key {
        Key::Named(named) => match named {
            NamedKey::ArrowUp => Some(ViewerKey::Up),
            NamedKey::ArrowDown => Some(ViewerKey::Down),
            NamedKey::Space => Some(ViewerKey::Space),
            NamedKey::Backspace => Some(ViewerKey::Backspace),
            NamedKey::Home => Some(ViewerKey::Home),
            NamedKey::Escape => Some(ViewerKey::Escape),
            _ => None,
        },
        Key::Character(value) => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(' '), None) => Some(ViewerKey::Space),
                (Some('+'), None) => Some(ViewerKey::Plus),
                (Some('-'), None) => Some(ViewerKey::Minus),
                (Some(c), None) => Some(ViewerKey::Character(c)),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_map_to_navigation() {
        assert_eq!(
            viewer_key(&Key::Named(NamedKey::ArrowDown)),
            Some(ViewerKey::Down)
        );
        assert_eq!(
            viewer_key(&Key::Named(NamedKey::Escape)),
            Some(ViewerKey::Escape)
        );
        assert_eq!(viewer_key(&Key::Named(NamedKey::F1)), None);
    }

    #[test]
    fn characters_map_through() {
        assert_eq!(
            viewer_key(&Key::Character("p".into())),
            Some(ViewerKey::Character('p'))
        );
        assert_eq!(
            viewer_key(&Key::Character(" ".into())),
            Some(ViewerKey::Space)
        );
        assert_eq!(viewer_key(&Key::Character("+".into())), Some(ViewerKey::Plus));
        assert_eq!(viewer_key(&Key::Character("ab".into())), None);
    }
}
