//! Chart colour assignment.

pub const DEFAULT_PALETTE: [&str; 7] = [
    "rgba(255, 99, 132, 0.6)",
    "rgba(54, 162, 235, 0.6)",
    "rgba(255, 206, 86, 0.6)",
    "rgba(60, 179, 113, 0.6)",
    "rgba(153, 102, 255, 0.6)",
    "rgba(255, 159, 64, 0.6)",
    "rgba(75, 0, 130, 0.6)",
];

/// `palette[index % palette.len()]`, `None` for an empty palette.
pub fn assign_color<S: AsRef<str>>(palette: &[S], index: usize) -> Option<&str> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[index % palette.len()].as_ref())
}

/// Colour per distinct name, by order of first appearance.
pub fn color_for_schools<'a, S, I>(palette: &[S], names: I) -> Vec<(String, String)>
where
    S: AsRef<str>,
    I: IntoIterator<Item = &'a str>,
{
    let mut assigned: Vec<(String, String)> = Vec::new();
    for name in names {
        if assigned.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        let Some(color) = assign_color(palette, assigned.len()) else {
            break;
        };
        assigned.push((name.to_string(), color.to_string()));
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around_palette() {
        assert_eq!(assign_color(&DEFAULT_PALETTE, 0), Some(DEFAULT_PALETTE[0]));
        assert_eq!(assign_color(&DEFAULT_PALETTE, 7), Some(DEFAULT_PALETTE[0]));
        assert_eq!(assign_color(&DEFAULT_PALETTE, 9), Some(DEFAULT_PALETTE[2]));
    }

    #[test]
    fn empty_palette_has_no_colour() {
        let empty: [&str; 0] = [];
        assert_eq!(assign_color(&empty, 3), None);
        assert!(color_for_schools(&empty, ["a"]).is_empty());
    }

    #[test]
    fn repeated_names_keep_their_colour() {
        let palette = ["red", "blue"];
        let colors = color_for_schools(&palette, ["A", "B", "A", "C"]);
        assert_eq!(
            colors,
            vec![
                ("A".to_string(), "red".to_string()),
                ("B".to_string(), "blue".to_string()),
                ("C".to_string(), "red".to_string()),
            ]
        );
    }
}
