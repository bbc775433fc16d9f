//! Handler dispatch over a tokenized content stream.
//!
//! Consumers register callbacks keyed either to a single operator or to all
//! operations, then run the processor once over the operation list. Keeping
//! the consumer a value (a closure over its own state) instead of a subclass
//! makes alternative consumers trivial to add next to the text assembler.

use super::Operation;
use crate::core::error::Result;
use crate::font::FontTable;

/// When a handler fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerCondition {
    /// Every operation.
    All,
    /// Operations whose operator equals the given token.
    Operand(String),
}

impl HandlerCondition {
    fn matches(&self, operation: &Operation) -> bool {
        match self {
            HandlerCondition::All => true,
            HandlerCondition::Operand(name) => operation.operator == *name,
        }
    }
}

type Handler<'a> = Box<dyn FnMut(&Operation, &FontTable) -> Result<()> + 'a>;

pub struct ContentStreamProcessor<'a> {
    operations: Vec<Operation>,
    handlers: Vec<(HandlerCondition, Handler<'a>)>,
}

impl<'a> ContentStreamProcessor<'a> {
    pub fn new(operations: Vec<Operation>) -> Self {
        ContentStreamProcessor {
            operations,
            handlers: Vec::new(),
        }
    }

    pub fn add_handler<F>(&mut self, condition: HandlerCondition, handler: F)
    where
        F: FnMut(&Operation, &FontTable) -> Result<()> + 'a,
    {
        self.handlers.push((condition, Box::new(handler)));
    }

    /// Runs every matching handler over every operation in order. The first
    /// handler error aborts processing.
    pub fn process(&mut self, fonts: &FontTable) -> Result<()> {
        for operation in &self.operations {
            for (condition, handler) in self.handlers.iter_mut() {
                if condition.matches(operation) {
                    handler(operation, fonts).map_err(|e| {
                        log::debug!("handler error on {:?}: {}", operation.operator, e);
                        e
                    })?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStreamParser;
    use crate::core::error::PdfError;

    fn ops(content: &str) -> Vec<Operation> {
        ContentStreamParser::new(content.as_bytes().to_vec())
            .parse()
            .unwrap()
    }

    #[test]
    fn all_condition_sees_every_operation() {
        let mut seen = Vec::new();
        let fonts = FontTable::new();
        {
            let mut processor = ContentStreamProcessor::new(ops("q 1 0 0 1 0 0 cm Q"));
            processor.add_handler(HandlerCondition::All, |op, _| {
                seen.push(op.operator.clone());
                Ok(())
            });
            processor.process(&fonts).unwrap();
        }
        assert_eq!(seen, vec!["q", "cm", "Q"]);
    }

    #[test]
    fn operand_condition_filters() {
        let mut count = 0;
        let fonts = FontTable::new();
        {
            let mut processor = ContentStreamProcessor::new(ops("(a) Tj (b) Tj ET"));
            processor.add_handler(HandlerCondition::Operand("Tj".to_string()), |_, _| {
                count += 1;
                Ok(())
            });
            processor.process(&fonts).unwrap();
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn handler_error_aborts_processing() {
        let mut calls = 0;
        let fonts = FontTable::new();
        let result = {
            let mut processor = ContentStreamProcessor::new(ops("q Q S"));
            processor.add_handler(HandlerCondition::All, |_, _| {
                calls += 1;
                if calls == 2 {
                    Err(PdfError::UnexpectedToken("boom".to_string()))
                } else {
                    Ok(())
                }
            });
            processor.process(&fonts)
        };
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn handlers_fire_in_registration_order() {
        let mut trace = Vec::new();
        let fonts = FontTable::new();
        {
            let trace_cell = std::cell::RefCell::new(&mut trace);
            let mut processor = ContentStreamProcessor::new(ops("S"));
            processor.add_handler(HandlerCondition::All, |_, _| {
                trace_cell.borrow_mut().push("first");
                Ok(())
            });
            processor.add_handler(HandlerCondition::All, |_, _| {
                trace_cell.borrow_mut().push("second");
                Ok(())
            });
            processor.process(&fonts).unwrap();
        }
        assert_eq!(trace, vec!["first", "second"]);
    }
}
