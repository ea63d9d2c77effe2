// ABOUTME: Logical pane and tab commands issued by keyboard shortcuts and menus.
// ABOUTME: Parses the textual form used by the driver, e.g. `split-vertical 1`.

use std::str::FromStr;

use numby_core::{LeafId, SplitId, TabId};
use numby_layout::Direction;

/// Which pane a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneTarget {
    Focused,
    Id(LeafId),
    /// Position in leaf order of the selected tab, 0-based
    Index(usize),
}

/// Which tab a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabTarget {
    Selected,
    Id(TabId),
    /// Position in tab order, 0-based
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Split {
        pane: PaneTarget,
        direction: Direction,
    },
    ClosePane(PaneTarget),
    UpdateRatio {
        split: SplitId,
        ratio: f32,
    },
    NewTab,
    CloseTab(TabTarget),
    SelectTab(TabTarget),
    FocusPane(PaneTarget),
    FocusNext,
    FocusPrevious,
    RenameTab {
        tab: TabTarget,
        name: String,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command} needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Too many arguments for {0}")]
    TooManyArguments(&'static str),

    #[error("Not a pane, split or tab reference: {0}")]
    InvalidTarget(String),

    #[error("Not a ratio: {0}")]
    InvalidRatio(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        let command = match name {
            "split-horizontal" => Command::Split {
                pane: pane_arg("split-horizontal", &args)?,
                direction: Direction::Horizontal,
            },
            "split-vertical" => Command::Split {
                pane: pane_arg("split-vertical", &args)?,
                direction: Direction::Vertical,
            },
            "close-pane" => Command::ClosePane(pane_arg("close-pane", &args)?),
            "focus-pane" => match args.as_slice() {
                [] => {
                    return Err(CommandError::MissingArgument {
                        command: "focus-pane",
                        argument: "pane",
                    })
                }
                _ => Command::FocusPane(pane_arg("focus-pane", &args)?),
            },
            "focus-next" => no_args("focus-next", &args, Command::FocusNext)?,
            "focus-previous" => no_args("focus-previous", &args, Command::FocusPrevious)?,
            "update-ratio" => match args.as_slice() {
                [split, ratio] => Command::UpdateRatio {
                    split: split
                        .parse()
                        .map_err(|_| CommandError::InvalidTarget(split.to_string()))?,
                    ratio: ratio
                        .parse()
                        .map_err(|_| CommandError::InvalidRatio(ratio.to_string()))?,
                },
                [_] => {
                    return Err(CommandError::MissingArgument {
                        command: "update-ratio",
                        argument: "ratio",
                    })
                }
                [] => {
                    return Err(CommandError::MissingArgument {
                        command: "update-ratio",
                        argument: "split id",
                    })
                }
                _ => return Err(CommandError::TooManyArguments("update-ratio")),
            },
            "new-tab" => no_args("new-tab", &args, Command::NewTab)?,
            "close-tab" => Command::CloseTab(tab_arg("close-tab", &args)?),
            "select-tab" => match args.as_slice() {
                [] => {
                    return Err(CommandError::MissingArgument {
                        command: "select-tab",
                        argument: "tab",
                    })
                }
                _ => Command::SelectTab(tab_arg("select-tab", &args)?),
            },
            "rename-tab" => match args.as_slice() {
                [tab, name @ ..] if !name.is_empty() => Command::RenameTab {
                    tab: parse_tab(tab)?,
                    name: name.join(" "),
                },
                _ => {
                    return Err(CommandError::MissingArgument {
                        command: "rename-tab",
                        argument: "tab and name",
                    })
                }
            },
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn no_args(
    command: &'static str,
    args: &[&str],
    parsed: Command,
) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::TooManyArguments(command))
    }
}

fn pane_arg(command: &'static str, args: &[&str]) -> Result<PaneTarget, CommandError> {
    match args {
        [] => Ok(PaneTarget::Focused),
        [arg] => {
            if let Ok(index) = arg.parse::<usize>() {
                return Ok(PaneTarget::Index(index));
            }
            arg.parse()
                .map(PaneTarget::Id)
                .map_err(|_| CommandError::InvalidTarget(arg.to_string()))
        }
        _ => Err(CommandError::TooManyArguments(command)),
    }
}

fn tab_arg(command: &'static str, args: &[&str]) -> Result<TabTarget, CommandError> {
    match args {
        [] => Ok(TabTarget::Selected),
        [arg] => parse_tab(arg),
        _ => Err(CommandError::TooManyArguments(command)),
    }
}

fn parse_tab(arg: &str) -> Result<TabTarget, CommandError> {
    if let Ok(index) = arg.parse::<usize>() {
        return Ok(TabTarget::Index(index));
    }
    arg.parse()
        .map(TabTarget::Id)
        .map_err(|_| CommandError::InvalidTarget(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_defaults_to_focused_pane() {
        assert_eq!(
            "split-horizontal".parse::<Command>().unwrap(),
            Command::Split {
                pane: PaneTarget::Focused,
                direction: Direction::Horizontal,
            }
        );
    }

    #[test]
    fn pane_targets_accept_index_or_id() {
        let leaf = LeafId::new();
        assert_eq!(
            "close-pane 2".parse::<Command>().unwrap(),
            Command::ClosePane(PaneTarget::Index(2))
        );
        assert_eq!(
            format!("split-vertical {}", leaf).parse::<Command>().unwrap(),
            Command::Split {
                pane: PaneTarget::Id(leaf),
                direction: Direction::Vertical,
            }
        );
    }

    #[test]
    fn update_ratio_parses_both_arguments() {
        let split = SplitId::new();
        assert_eq!(
            format!("update-ratio {} 0.3", split).parse::<Command>().unwrap(),
            Command::UpdateRatio { split, ratio: 0.3 }
        );
        assert_eq!(
            format!("update-ratio {} wide", split).parse::<Command>(),
            Err(CommandError::InvalidRatio("wide".to_string()))
        );
        assert!(matches!(
            "update-ratio".parse::<Command>(),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn tab_commands() {
        assert_eq!("new-tab".parse::<Command>().unwrap(), Command::NewTab);
        assert_eq!(
            "close-tab".parse::<Command>().unwrap(),
            Command::CloseTab(TabTarget::Selected)
        );
        assert_eq!(
            "select-tab 0".parse::<Command>().unwrap(),
            Command::SelectTab(TabTarget::Index(0))
        );
        assert_eq!(
            "rename-tab 1 Monthly budget".parse::<Command>().unwrap(),
            Command::RenameTab {
                tab: TabTarget::Index(1),
                name: "Monthly budget".to_string(),
            }
        );
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "explode".parse::<Command>(),
            Err(CommandError::Unknown("explode".to_string()))
        );
        assert_eq!(
            "new-tab now".parse::<Command>(),
            Err(CommandError::TooManyArguments("new-tab"))
        );
        assert_eq!(
            "close-pane left".parse::<Command>(),
            Err(CommandError::InvalidTarget("left".to_string()))
        );
        assert!("select-tab".parse::<Command>().is_err());
        assert!("rename-tab 0".parse::<Command>().is_err());
    }
}
