//! Logs module: turning a raw job trace into something a viewer can show.

pub mod decoration;
pub mod folding;
pub mod render;
pub mod section;

pub use decoration::DecorationOptions;
pub use folding::{folding_regions, FoldingRegion};
pub use render::{render, Decorations, LineRange, RenderedLog, RUNNING_KEY};
pub use section::{Section, Sections};

/// A trimmed-down trace as produced by a docker executor.
#[cfg(test)]
pub(crate) const SAMPLE_TRACE: &str = concat!(
    "\x1b[0KRunning with gitlab-runner 16.5.0 (853330f9)\x1b[0;m\n",
    "section_start:1700000000:prepare_executor\r\x1b[0K",
    "\x1b[0K\x1b[36;1mPreparing the \"docker\" executor\x1b[0;m\x1b[0;m\n",
    "\x1b[0KUsing Docker executor with image ruby:3.2 ...\x1b[0;m\n",
    "section_end:1700000004:prepare_executor\r\x1b[0K\n",
    "section_start:1700000004:step_script\r\x1b[0K",
    "\x1b[0K\x1b[36;1mExecuting \"step_script\" stage of the job script\x1b[0;m\x1b[0;m\n",
    "\x1b[32;1m$ bundle exec rspec\x1b[0;m\n",
    "Finished in 1.2 seconds\n",
    "section_end:1700000010:step_script\r\x1b[0K\n",
    "\x1b[32;1mJob succeeded\x1b[0;m\n",
);
