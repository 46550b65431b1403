// Selection and hover state for the building layer
use crate::info_panel::{info_panel, tooltip, InfoPanel};
use crate::models::Building;

/// Pointer interaction with the building layer. Buildings are held by
/// value so a selection survives the collection being replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Neither,
    HoveredOnly(Building),
    SelectedOnly(Building),
    SelectedAndHovered {
        selected: Building,
        hovered: Building,
    },
}

/// What the overlay should show for the current interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Display {
    InfoPanel(InfoPanel),
    Tooltip(String),
    Nothing,
}

impl Interaction {
    fn from_parts(selected: Option<Building>, hovered: Option<Building>) -> Self {
        match (selected, hovered) {
            (None, None) => Interaction::Neither,
            (None, Some(h)) => Interaction::HoveredOnly(h),
            (Some(s), None) => Interaction::SelectedOnly(s),
            (Some(selected), Some(hovered)) => Interaction::SelectedAndHovered { selected, hovered },
        }
    }

    fn into_parts(self) -> (Option<Building>, Option<Building>) {
        match self {
            Interaction::Neither => (None, None),
            Interaction::HoveredOnly(h) => (None, Some(h)),
            Interaction::SelectedOnly(s) => (Some(s), None),
            Interaction::SelectedAndHovered { selected, hovered } => (Some(selected), Some(hovered)),
        }
    }

    fn replace(&mut self, f: impl FnOnce(Option<Building>, Option<Building>) -> Self) {
        let (selected, hovered) = std::mem::take(self).into_parts();
        *self = f(selected, hovered);
    }

    pub fn selected(&self) -> Option<&Building> {
        match self {
            Interaction::SelectedOnly(s) | Interaction::SelectedAndHovered { selected: s, .. } => Some(s),
            _ => None,
        }
    }

    pub fn hovered(&self) -> Option<&Building> {
        match self {
            Interaction::HoveredOnly(h) | Interaction::SelectedAndHovered { hovered: h, .. } => Some(h),
            _ => None,
        }
    }

    pub fn pointer_enter(&mut self, building: Building) {
        self.replace(|selected, _| Self::from_parts(selected, Some(building)));
    }

    pub fn pointer_leave(&mut self) {
        self.replace(|selected, _| Self::from_parts(selected, None));
    }

    /// Click on a building selects it; a click on empty space clears the
    /// selection. Hover is left alone either way.
    pub fn click(&mut self, target: Option<Building>) {
        self.replace(|_, hovered| Self::from_parts(target, hovered));
    }

    /// Close button on the info panel.
    pub fn close(&mut self) {
        self.click(None);
    }

    /// Selection wins over hover: the tooltip is suppressed while the info
    /// panel is open.
    pub fn display(&self) -> Display {
        if let Some(selected) = self.selected() {
            Display::InfoPanel(info_panel(selected))
        } else if let Some(hovered) = self.hovered() {
            Display::Tooltip(tooltip(hovered))
        } else {
            Display::Nothing
        }
    }
}
