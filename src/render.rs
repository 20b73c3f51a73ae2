use crate::backtracking_search::{Assignment, Choice};
use crate::grid_config::GridConfig;
use crate::word_list::WordList;

/// Character drawn for blocked cells.
pub const BLOCK: char = '█';

/// Place each assigned word's letters into a `height` x `width` grid of cells.
pub fn letter_grid(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; config.width]; config.height];

    for Choice { slot_id, word_id } in assignment.choices() {
        let word = word_list.word(word_id);

        for ((row, col), &glyph) in config.slot_configs[slot_id].cell_coords().zip(&word.glyphs) {
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Turn the given grid config and assignment into a rendered string, one line per row, with
/// blocks drawn as `█` and unfilled open cells as spaces.
pub fn render_grid(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    let letters = letter_grid(config, word_list, assignment);

    config
        .structure
        .iter()
        .zip(&letters)
        .map(|(structure_row, letter_row)| {
            structure_row
                .iter()
                .zip(letter_row)
                .map(|(&open, &letter)| if open { letter.unwrap_or(' ') } else { BLOCK })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{find_fill, FillOptions};

    #[test]
    fn test_render_filled_grid() {
        let config = GridConfig::from_structure("___\n_#_\n___").unwrap();
        let word_list = WordList::new(["abc", "ade", "cfg", "ehg"]);

        let result = find_fill(&config, &word_list, FillOptions::default()).expect("Failed to find a fill");
        let rendered = render_grid(&config, &word_list, &result.assignment);

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.chars().count() == 3));
        assert_eq!(lines[1].chars().nth(1), Some(BLOCK));
        assert!(!rendered.contains(' '));
    }

    #[test]
    fn test_render_partial_assignment() {
        let config = GridConfig::from_structure("___\n_\n#").unwrap();
        let word_list = WordList::new(["cat"]);
        let assignment = Assignment::new(2).with_choice(Choice { slot_id: 0, word_id: 0 });

        assert_eq!(render_grid(&config, &word_list, &assignment), "cat\n ██\n███");
    }
}
