use serde::{Deserialize, Serialize};

use crate::events::{AppEvent, EventBus};

/// One book offer sitting in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub book_id: u64,
    pub title: String,
    /// Unit price in VND
    pub unit_price: i64,
    pub quantity: u32,
    /// Whether the line takes part in checkout and the subtotal
    pub selected: bool,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Cart contents with per-line checkout selection
///
/// The subtotal only counts selected lines - shoppers park offers in the
/// cart and check out a subset. Mutations announce themselves on the event
/// bus so badges and summaries refetch.
#[derive(Debug)]
pub struct Cart {
    lines: Vec<CartLine>,
    bus: EventBus,
}

impl Cart {
    pub fn new(bus: EventBus) -> Self {
        Self {
            lines: Vec::new(),
            bus,
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging quantities when the book is already present
    pub fn add(&mut self, line: CartLine) {
        match self.lines.iter_mut().find(|l| l.book_id == line.book_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
        self.changed();
    }

    /// Remove a line; returns false when the book was not in the cart
    pub fn remove(&mut self, book_id: u64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.book_id != book_id);

        let removed = self.lines.len() != before;
        if removed {
            self.changed();
        }
        removed
    }

    pub fn set_quantity(&mut self, book_id: u64, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(book_id);
        }

        let Some(line) = self.lines.iter_mut().find(|l| l.book_id == book_id) else {
            return false;
        };
        line.quantity = quantity;
        self.changed();
        true
    }

    pub fn set_selected(&mut self, book_id: u64, selected: bool) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.book_id == book_id) else {
            return false;
        };
        line.selected = selected;
        self.changed();
        true
    }

    pub fn toggle_selected(&mut self, book_id: u64) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.book_id == book_id) else {
            return false;
        };
        line.selected = !line.selected;
        self.changed();
        true
    }

    pub fn clear(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        self.lines.clear();
        self.changed();
    }

    /// Subtotal over selected lines only
    pub fn subtotal(&self) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.selected)
            .map(CartLine::line_total)
            .sum()
    }

    /// Lines that will be checked out
    pub fn selected_lines(&self) -> Vec<&CartLine> {
        self.lines.iter().filter(|l| l.selected).collect()
    }

    fn changed(&self) {
        self.bus.publish(AppEvent::CartUpdated {
            item_count: self.lines.len(),
        });
    }
}
