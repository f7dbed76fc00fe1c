#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Structure,
    Browse,
    Sql,
}

impl View {
    pub const ALL: [View; 3] = [View::Structure, View::Browse, View::Sql];

    pub fn label(&self) -> &'static str {
        match self {
            View::Structure => "Database Structure",
            View::Browse => "Browse Data",
            View::Sql => "Execute SQL",
        }
    }

    /// Key that switches to this view.
    pub fn key(&self) -> char {
        match self {
            View::Structure => 'd',
            View::Browse => 'b',
            View::Sql => 'e',
        }
    }

    pub fn from_key(c: char) -> Option<View> {
        View::ALL.into_iter().find(|v| v.key() == c)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureFocus {
    Tree,
    Detail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowseFocus {
    Tables,
    Filter,
    Grid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlFocus {
    Editor,
    Results,
}

/// Pagination buttons under a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavButton {
    First,
    Prev,
    Next,
    Last,
}

impl NavButton {
    pub const ALL: [NavButton; 4] = [
        NavButton::First,
        NavButton::Prev,
        NavButton::Next,
        NavButton::Last,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NavButton::First => " ◀◀ ",
            NavButton::Prev => " ◀ Prev ",
            NavButton::Next => " Next ▶ ",
            NavButton::Last => " ▶▶ ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_keys() {
        assert_eq!(View::from_key('d'), Some(View::Structure));
        assert_eq!(View::from_key('b'), Some(View::Browse));
        assert_eq!(View::from_key('e'), Some(View::Sql));
        assert_eq!(View::from_key('x'), None);
    }
}
