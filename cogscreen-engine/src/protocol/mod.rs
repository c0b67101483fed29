//! Variant-specific stimulus presentation and response capture behind one
//! shared skeleton.

mod cpt;
mod digit_span;
mod tmt;

pub(crate) use cpt::CptProtocol;
pub use digit_span::digit_sequence;
pub(crate) use digit_span::DigitSpanProtocol;
pub use tmt::{layout_trail, trail_labels, MAX_PART_B_ITEMS};
pub(crate) use tmt::TmtProtocol;

use cogscreen_core::{Response, Scores, Screen, TestConfiguration, VariantConfig};
use rand::Rng;

use crate::scheduler::{Cue, Flow, RunContext};

pub(crate) enum Protocol {
    Cpt(CptProtocol),
    Tmt(TmtProtocol),
    DigitSpan(DigitSpanProtocol),
}

impl Protocol {
    pub fn for_configuration(config: &TestConfiguration) -> Self {
        match &config.settings {
            VariantConfig::Cpt(cpt) => Protocol::Cpt(CptProtocol::new(config, cpt)),
            VariantConfig::Tmt(tmt) => Protocol::Tmt(TmtProtocol::new(tmt)),
            VariantConfig::DigitSpan(span) => {
                Protocol::DigitSpan(DigitSpanProtocol::new(config, span))
            }
        }
    }

    /// Arms the first presentation after `start()`.
    pub fn begin<R: Rng>(&mut self, ctx: &mut RunContext<R>) {
        match self {
            Protocol::Cpt(p) => p.begin(ctx),
            Protocol::Tmt(p) => p.begin(ctx),
            Protocol::DigitSpan(p) => p.begin(ctx),
        }
    }

    pub fn on_cue<R: Rng>(&mut self, cue: Cue, ctx: &mut RunContext<R>) -> Flow {
        match self {
            Protocol::Cpt(p) => p.on_cue(cue, ctx),
            Protocol::Tmt(p) => p.on_cue(cue, ctx),
            Protocol::DigitSpan(p) => p.on_cue(cue, ctx),
        }
    }

    /// `None` when the response fell outside any open window.
    pub fn on_response<R: Rng>(
        &mut self,
        response: Response,
        ctx: &mut RunContext<R>,
    ) -> Option<Flow> {
        match self {
            Protocol::Cpt(p) => p.on_response(response, ctx),
            Protocol::Tmt(p) => p.on_response(response, ctx),
            Protocol::DigitSpan(p) => p.on_response(response, ctx),
        }
    }

    /// Closes whatever is still open when the run ends.
    pub fn close<R>(&mut self, ctx: &mut RunContext<R>) {
        match self {
            Protocol::Cpt(p) => p.close(ctx),
            Protocol::Tmt(p) => p.close(ctx),
            Protocol::DigitSpan(p) => p.close(ctx),
        }
    }

    pub fn scores<R>(&self, ctx: &RunContext<R>) -> Scores {
        match self {
            Protocol::Cpt(p) => Scores::Cpt(p.scores(ctx)),
            Protocol::Tmt(p) => Scores::Tmt(p.scores()),
            Protocol::DigitSpan(p) => Scores::DigitSpan(p.scores()),
        }
    }

    pub fn screen(&self) -> Screen {
        match self {
            Protocol::Cpt(p) => p.screen(),
            Protocol::Tmt(p) => p.screen(),
            Protocol::DigitSpan(p) => p.screen(),
        }
    }
}
