//! Actions offered by the toolbar popup and which of them may run together.

/// A toolbar action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolOption {
    NewNews,
    DynamicTemplate,
    Topics,
}

impl ToolOption {
    /// Table order; selected options run in this order.
    pub const ALL: [ToolOption; 3] = [Self::NewNews, Self::DynamicTemplate, Self::Topics];

    pub fn id(&self) -> &'static str {
        match self {
            Self::NewNews => "new-news",
            Self::DynamicTemplate => "dynamic-template",
            Self::Topics => "topics",
        }
    }

    pub fn from_id(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.id() == s)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewNews => "New News",
            Self::DynamicTemplate => "Dynamic Template",
            Self::Topics => "Topics",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NewNews => "Create a new news page for the selected week, if missing",
            Self::DynamicTemplate => "Fixes the dates from the template if the template is used",
            Self::Topics => "Try to get the topics from the text by semantically analyzing it",
        }
    }

    /// Options that cannot be switched on while this one is active.
    pub fn not_compatible_with(&self) -> &'static [ToolOption] {
        match self {
            Self::NewNews => &[Self::DynamicTemplate, Self::Topics],
            Self::DynamicTemplate => &[Self::NewNews],
            Self::Topics => &[Self::NewNews],
        }
    }
}

/// Which options are switched on. Never mutated in place; every toggle
/// returns a new state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    active: Vec<ToolOption>,
}

impl SelectionState {
    /// Build a state from an explicit list, rejecting incompatible pairs.
    pub fn from_active(options: &[ToolOption]) -> Result<Self, (ToolOption, ToolOption)> {
        let state = Self {
            active: ToolOption::ALL
                .into_iter()
                .filter(|o| options.contains(o))
                .collect(),
        };
        validate(&state)?;
        Ok(state)
    }

    pub fn is_active(&self, option: ToolOption) -> bool {
        self.active.contains(&option)
    }

    /// Active options in table order.
    pub fn active(&self) -> &[ToolOption] {
        &self.active
    }
}

/// An option is disabled while any active option declares it incompatible.
pub fn is_option_disabled(state: &SelectionState, option: ToolOption) -> bool {
    state
        .active
        .iter()
        .any(|active| active.not_compatible_with().contains(&option))
}

/// Flip `option`, unless an active option rules it out.
pub fn toggle_option(state: &SelectionState, option: ToolOption) -> SelectionState {
    if is_option_disabled(state, option) {
        return state.clone();
    }
    let active = ToolOption::ALL
        .into_iter()
        .filter(|o| {
            if *o == option {
                !state.is_active(option)
            } else {
                state.is_active(*o)
            }
        })
        .collect();
    SelectionState { active }
}

/// First active pair where one option rules out the other.
pub fn validate(state: &SelectionState) -> Result<(), (ToolOption, ToolOption)> {
    for a in &state.active {
        for b in a.not_compatible_with() {
            if state.is_active(*b) {
                return Err((*a, *b));
            }
        }
    }
    Ok(())
}
