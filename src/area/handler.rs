//! Pipeline stages feeding element streams through a shared manager,
//! so a file decoder, the manager and the output writer can each run on
//! their own thread.

use crate::area::assembler::Assembler;
use crate::area::manager::MultipolygonManager;
use crate::area::{OtherData, Timings};
use crate::callback::CallFinish;
use crate::check_order::CheckOrder;
use crate::elements::{Element, ElementType, Node, Relation, Way};
use crate::utils::{Error, Result, ThreadTimer};

use std::sync::{Arc, Mutex};

/// First pass: relations are handed to the manager, everything else is
/// skipped.
pub struct FirstPass<A: Assembler> {
    manager: Arc<Mutex<MultipolygonManager<A>>>,
    tm: f64,
}

impl<A: Assembler> FirstPass<A> {
    pub fn new(manager: Arc<Mutex<MultipolygonManager<A>>>) -> FirstPass<A> {
        FirstPass { manager, tm: 0.0 }
    }
}

impl<A> CallFinish for FirstPass<A>
where
    A: Assembler + 'static,
    A::Config: Send + 'static,
{
    type CallType = Vec<Element>;
    type ReturnType = Timings;
    type ErrorType = Error;

    fn call(&mut self, els: Vec<Element>) {
        let tx = ThreadTimer::new();
        let mut manager = self.manager.lock().unwrap();
        for el in els {
            if let Element::Relation(r) = el {
                manager.relation(r);
            }
        }
        self.tm += tx.since();
    }

    fn finish(&mut self) -> Result<Timings> {
        let mut tms = Timings::new();
        tms.add("first pass", self.tm);
        Ok(tms)
    }
}

/// Second pass: the input is checked for canonical order, ways are
/// offered to the manager, the output is flushed at the end. The first
/// order violation is latched and surfaced by [finish].
pub struct SecondPass<A: Assembler> {
    manager: Arc<Mutex<MultipolygonManager<A>>>,
    check: CheckOrder,
    err: Option<Error>,
    tm: f64,
}

impl<A: Assembler> SecondPass<A> {
    pub fn new(manager: Arc<Mutex<MultipolygonManager<A>>>) -> SecondPass<A> {
        SecondPass {
            manager,
            check: CheckOrder::new(),
            err: None,
            tm: 0.0,
        }
    }

    pub fn node(&mut self, n: &Node) -> Result<()> {
        self.check.check_id(ElementType::Node, n.id)
    }

    pub fn way(&mut self, w: &Way) -> Result<()> {
        self.check.check_id(ElementType::Way, w.id)?;
        self.manager.lock().unwrap().way(w);
        Ok(())
    }

    pub fn relation(&mut self, r: &Relation) -> Result<()> {
        self.check.check_id(ElementType::Relation, r.id)
    }

    pub fn flush(&mut self) -> Result<()> {
        let mut manager = self.manager.lock().unwrap();
        manager.flush_output();
        manager.report_incomplete();
        Ok(())
    }

    fn element(&mut self, el: &Element) -> Result<()> {
        match el {
            Element::Node(n) => self.node(n),
            Element::Way(w) => self.way(w),
            Element::Relation(r) => self.relation(r),
        }
    }
}

impl<A> CallFinish for SecondPass<A>
where
    A: Assembler + 'static,
    A::Config: Send + 'static,
{
    type CallType = Vec<Element>;
    type ReturnType = Timings;
    type ErrorType = Error;

    fn call(&mut self, els: Vec<Element>) {
        if self.err.is_some() {
            return;
        }
        let tx = ThreadTimer::new();
        for el in &els {
            if let Err(e) = self.element(el) {
                self.err = Some(e);
                break;
            }
        }
        self.tm += tx.since();
    }

    fn finish(&mut self) -> Result<Timings> {
        if let Some(e) = self.err.take() {
            return Err(e);
        }
        self.flush()?;

        let stats = self.manager.lock().unwrap().stats();
        let mut tms = Timings::new();
        tms.add("second pass", self.tm);
        tms.add_other(
            "second pass",
            OtherData::Messages(vec![format!("{}", stats)]),
        );
        Ok(tms)
    }
}
