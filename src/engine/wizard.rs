use log::info;
use serde::Serialize;

use crate::engine::form::PositionForm;
use crate::engine::range::seed_range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Step {
    Step1,
    Step2,
}

/// Display label of a step indicator. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Completed,
    Active,
    Upcoming,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced(Step),
    Retreated(Step),
    /// Allowed, but nothing to move to.
    Unchanged,
    /// Gate refused; state untouched.
    Rejected,
}

impl Transition {
    pub fn moved(self) -> bool {
        matches!(self, Transition::Advanced(_) | Transition::Retreated(_))
    }
}

/// Two-step wizard: pair + fee, then range + amounts.
/// `highest_visited` only grows, and only on forward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wizard {
    active: Step,
    highest_visited: Step,
}

impl Default for Wizard {
    fn default() -> Self {
        Self { active: Step::Step1, highest_visited: Step::Step1 }
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Step {
        self.active
    }

    pub fn highest_visited(&self) -> Step {
        self.highest_visited
    }

    fn is_valid(step: Step, form: &PositionForm) -> bool {
        match step {
            Step::Step1 => form.step1.valid,
            Step::Step2 => form.step2.valid,
        }
    }

    /// Advances when the active step is valid. From step 2 there is nowhere further to go;
    /// submitting the position is the caller's business.
    pub fn go_next(&mut self, form: &mut PositionForm) -> Transition {
        if !Self::is_valid(self.active, form) {
            info!("Step {:?} is not valid yet ({:?})", self.active, form.step1.reason.or(form.step2.reason));
            return Transition::Rejected;
        }
        match self.active {
            Step::Step1 => self.enter_step2(form),
            Step::Step2 => Transition::Unchanged,
        }
    }

    fn enter_step2(&mut self, form: &mut PositionForm) -> Transition {
        self.active = Step::Step2;
        self.highest_visited = self.highest_visited.max(Step::Step2);
        if let Some(price) = form.current_price {
            form.set_range(seed_range(price));
        }
        form.reveal_both_amounts();
        info!("Entered step 2, range {:?}", form.range);
        Transition::Advanced(Step::Step2)
    }

    /// Back to step 1 with a full form reset.
    pub fn go_back(&mut self, form: &mut PositionForm) -> Transition {
        match self.active {
            Step::Step1 => Transition::Unchanged,
            Step::Step2 => {
                self.active = Step::Step1;
                form.reset();
                info!("Back to step 1, form cleared");
                Transition::Retreated(Step::Step1)
            }
        }
    }

    pub fn cancel(&mut self, form: &mut PositionForm) {
        self.active = Step::Step1;
        form.reset();
        info!("Wizard cancelled");
    }

    /// Direct jump from a step indicator. Steps past `highest_visited` are locked.
    pub fn select_step(&mut self, step: Step, form: &mut PositionForm) -> Transition {
        if step > self.highest_visited {
            return Transition::Rejected;
        }
        match (self.active, step) {
            (Step::Step1, Step::Step1) if form.step1.valid => self.go_next(form),
            (Step::Step1, Step::Step2) => self.enter_step2(form),
            (Step::Step2, Step::Step1) => self.go_back(form),
            _ => Transition::Unchanged,
        }
    }

    pub fn status(&self, step: Step, form: &PositionForm) -> StepStatus {
        if step < self.active || (step == self.active && Self::is_valid(step, form)) {
            StepStatus::Completed
        } else if step == self.active {
            StepStatus::Active
        } else if step <= self.highest_visited {
            StepStatus::Upcoming
        } else {
            StepStatus::Locked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::form::{StepValidity, ValidityReason};
    use crate::models::{FeeTier, PriceRange, Side};

    fn valid_step1_form() -> PositionForm {
        let mut form = PositionForm::new();
        form.set_fee(Some(FeeTier::Medium));
        form.current_price = Some(5000.0);
        form.step1 = StepValidity::valid();
        form
    }

    #[test]
    fn test_go_next_is_gated() {
        let mut wizard = Wizard::new();
        let mut form = PositionForm::new();
        form.step1 = StepValidity::invalid(ValidityReason::IncompleteFields);
        assert_eq!(wizard.go_next(&mut form), Transition::Rejected);
        assert_eq!(wizard.active(), Step::Step1);
        assert_eq!(wizard.highest_visited(), Step::Step1);
    }

    #[test]
    fn test_go_next_seeds_range_and_reveals_amounts() {
        let mut wizard = Wizard::new();
        let mut form = valid_step1_form();
        form.hidden = Some(Side::A);
        assert_eq!(wizard.go_next(&mut form), Transition::Advanced(Step::Step2));
        assert_eq!(form.range, PriceRange::new(4250.0, 5750.0));
        assert_eq!(form.min_price_input, "4250");
        assert!(form.hidden.is_none());
    }

    #[test]
    fn test_locked_step_cannot_be_selected() {
        let mut wizard = Wizard::new();
        let mut form = valid_step1_form();
        assert_eq!(wizard.select_step(Step::Step2, &mut form), Transition::Rejected);
        assert_eq!(wizard.active(), Step::Step1);
        assert_eq!(wizard.status(Step::Step2, &form), StepStatus::Locked);
    }

    #[test]
    fn test_clicking_valid_step1_advances() {
        let mut wizard = Wizard::new();
        let mut form = valid_step1_form();
        assert_eq!(wizard.status(Step::Step1, &form), StepStatus::Completed);
        assert_eq!(wizard.select_step(Step::Step1, &mut form), Transition::Advanced(Step::Step2));
    }

    #[test]
    fn test_back_resets_but_keeps_highest() {
        let mut wizard = Wizard::new();
        let mut form = valid_step1_form();
        wizard.go_next(&mut form);
        form.edit_amount(Side::A, "10");

        assert_eq!(wizard.go_back(&mut form), Transition::Retreated(Step::Step1));
        assert!(form.fee.is_none());
        assert_eq!(form.amounts.amount_a, "");
        assert_eq!(wizard.highest_visited(), Step::Step2);
        assert_eq!(wizard.status(Step::Step2, &form), StepStatus::Upcoming);

        // previously reached step stays reachable even though its data is gone
        assert_eq!(wizard.select_step(Step::Step2, &mut form), Transition::Advanced(Step::Step2));
        assert_eq!(wizard.select_step(Step::Step1, &mut form), Transition::Retreated(Step::Step1));
    }

    #[test]
    fn test_go_back_on_step1_is_noop() {
        let mut wizard = Wizard::new();
        let mut form = valid_step1_form();
        assert_eq!(wizard.go_back(&mut form), Transition::Unchanged);
        assert_eq!(form.fee, Some(FeeTier::Medium));
    }
}
