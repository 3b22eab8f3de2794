// Recording compositor - Call log decorator for tests and diagnostics
//
// Wraps another compositor (a `SoftwareCompositor` by default), forwards
// every call to it and keeps an ordered log of the calls that succeeded.
// The log can be grouped per transaction or exported as JSON.
//
// It can also be told to refuse resource creation, display opening or
// element operations, to exercise the failure paths of its callers.

use super::{
    Compositor, CompositorError, DisplayHandle, ElementDesc, ElementHandle, ImageFormat,
    ResourceHandle, SoftwareCompositor, TxnHandle,
};
use crate::layout::Rect;
use crate::palette::{PaletteMode, PaletteTable};
use serde::Serialize;

/// One successful compositor call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CompositorCall {
    /// `open_display`
    OpenDisplay { display: DisplayHandle },
    /// `create_resource`
    CreateResource {
        resource: ResourceHandle,
        width: u32,
        height: u32,
    },
    /// `destroy_resource`
    DestroyResource { resource: ResourceHandle },
    /// `write_resource`
    WriteResource {
        resource: ResourceHandle,
        rect: Rect,
        pitch: usize,
    },
    /// `set_resource_palette`
    SetResourcePalette {
        resource: ResourceHandle,
        transparent: bool,
    },
    /// `begin_transaction`
    BeginTransaction { txn: TxnHandle },
    /// `submit_transaction`
    SubmitTransaction { txn: TxnHandle },
    /// `abort_transaction`
    AbortTransaction { txn: TxnHandle },
    /// `add_element`
    AddElement {
        txn: TxnHandle,
        element: ElementHandle,
        desc: ElementDesc,
    },
    /// `remove_element`
    RemoveElement {
        txn: TxnHandle,
        element: ElementHandle,
    },
    /// `change_element_source`
    ChangeElementSource {
        txn: TxnHandle,
        element: ElementHandle,
        resource: ResourceHandle,
    },
}

impl CompositorCall {
    /// Transaction this call belongs to, if any
    pub fn txn(&self) -> Option<TxnHandle> {
        match self {
            CompositorCall::BeginTransaction { txn }
            | CompositorCall::SubmitTransaction { txn }
            | CompositorCall::AbortTransaction { txn }
            | CompositorCall::AddElement { txn, .. }
            | CompositorCall::RemoveElement { txn, .. }
            | CompositorCall::ChangeElementSource { txn, .. } => Some(*txn),
            _ => None,
        }
    }
}

/// The calls made inside one transaction, begin to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransaction {
    /// Transaction handle
    pub txn: TxnHandle,
    /// Element operations queued in the transaction
    pub ops: Vec<CompositorCall>,
    /// Whether the transaction was submitted
    pub submitted: bool,
    /// Whether the transaction was aborted
    pub aborted: bool,
}

/// Compositor decorator that logs every successful call
#[derive(Debug)]
pub struct RecordingCompositor<C: Compositor = SoftwareCompositor> {
    /// Wrapped compositor
    inner: C,

    /// Ordered call log
    calls: Vec<CompositorCall>,

    /// Resource creations still allowed before refusing (None = unlimited)
    creations_left: Option<usize>,

    /// Refuse to open the display
    refuse_display: bool,

    /// Refuse to queue element operations
    refuse_elements: bool,
}

impl RecordingCompositor<SoftwareCompositor> {
    /// Record calls against a software compositor of the given display size
    pub fn new(width: u32, height: u32) -> Self {
        Self::wrap(SoftwareCompositor::new(width, height))
    }
}

impl<C: Compositor> RecordingCompositor<C> {
    /// Record calls against an existing compositor
    pub fn wrap(inner: C) -> Self {
        Self {
            inner,
            calls: Vec::new(),
            creations_left: None,
            refuse_display: false,
            refuse_elements: false,
        }
    }

    /// The wrapped compositor
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Recorded calls in order
    pub fn calls(&self) -> &[CompositorCall] {
        &self.calls
    }

    /// Forget all recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching a predicate
    pub fn count(&self, predicate: impl Fn(&CompositorCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Group the recorded element operations by transaction
    ///
    /// Transactions appear in the order they were begun.
    pub fn transactions(&self) -> Vec<RecordedTransaction> {
        let mut out: Vec<RecordedTransaction> = Vec::new();

        for call in &self.calls {
            match call {
                CompositorCall::BeginTransaction { txn } => out.push(RecordedTransaction {
                    txn: *txn,
                    ops: Vec::new(),
                    submitted: false,
                    aborted: false,
                }),
                CompositorCall::SubmitTransaction { txn } => {
                    if let Some(t) = out.iter_mut().find(|t| t.txn == *txn) {
                        t.submitted = true;
                    }
                }
                CompositorCall::AbortTransaction { txn } => {
                    if let Some(t) = out.iter_mut().find(|t| t.txn == *txn) {
                        t.aborted = true;
                    }
                }
                other => {
                    if let Some(txn) = other.txn() {
                        if let Some(t) = out.iter_mut().find(|t| t.txn == txn) {
                            t.ops.push(other.clone());
                        }
                    }
                }
            }
        }

        out
    }

    /// Allow `count` more resource creations, then refuse every later one
    pub fn fail_resource_creation_after(&mut self, count: usize) {
        self.creations_left = Some(count);
    }

    /// Refuse (or stop refusing) to open the display
    pub fn set_refuse_display(&mut self, refuse: bool) {
        self.refuse_display = refuse;
    }

    /// Refuse (or stop refusing) to queue element operations
    pub fn set_refuse_elements(&mut self, refuse: bool) {
        self.refuse_elements = refuse;
    }

    fn check_elements_allowed(&self, txn: TxnHandle) -> Result<(), CompositorError> {
        if self.refuse_elements {
            return Err(CompositorError::ElementRefused(txn));
        }
        Ok(())
    }

    /// Export the call log as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.calls)
    }
}

impl<C: Compositor> Compositor for RecordingCompositor<C> {
    fn open_display(&mut self) -> Result<DisplayHandle, CompositorError> {
        if self.refuse_display {
            return Err(CompositorError::DisplayUnavailable);
        }
        let display = self.inner.open_display()?;
        self.calls.push(CompositorCall::OpenDisplay { display });
        Ok(display)
    }

    fn display_bounds(&self, display: DisplayHandle) -> Result<(u32, u32), CompositorError> {
        self.inner.display_bounds(display)
    }

    fn create_resource(
        &mut self,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<ResourceHandle, CompositorError> {
        if let Some(left) = self.creations_left.as_mut() {
            if *left == 0 {
                return Err(CompositorError::ResourceRefused { width, height });
            }
            *left -= 1;
        }
        let resource = self.inner.create_resource(format, width, height)?;
        self.calls.push(CompositorCall::CreateResource {
            resource,
            width,
            height,
        });
        Ok(resource)
    }

    fn destroy_resource(&mut self, resource: ResourceHandle) -> Result<(), CompositorError> {
        self.inner.destroy_resource(resource)?;
        self.calls.push(CompositorCall::DestroyResource { resource });
        Ok(())
    }

    fn write_resource(
        &mut self,
        resource: ResourceHandle,
        rect: Rect,
        pitch: usize,
        pixels: &[u8],
    ) -> Result<(), CompositorError> {
        self.inner.write_resource(resource, rect, pitch, pixels)?;
        self.calls.push(CompositorCall::WriteResource {
            resource,
            rect,
            pitch,
        });
        Ok(())
    }

    fn set_resource_palette(
        &mut self,
        resource: ResourceHandle,
        palette: PaletteTable<'_>,
    ) -> Result<(), CompositorError> {
        self.inner.set_resource_palette(resource, palette)?;
        self.calls.push(CompositorCall::SetResourcePalette {
            resource,
            transparent: palette.mode() == PaletteMode::Transparent,
        });
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<TxnHandle, CompositorError> {
        let txn = self.inner.begin_transaction()?;
        self.calls.push(CompositorCall::BeginTransaction { txn });
        Ok(txn)
    }

    fn submit_transaction(&mut self, txn: TxnHandle) -> Result<(), CompositorError> {
        self.inner.submit_transaction(txn)?;
        self.calls.push(CompositorCall::SubmitTransaction { txn });
        Ok(())
    }

    fn abort_transaction(&mut self, txn: TxnHandle) -> Result<(), CompositorError> {
        self.inner.abort_transaction(txn)?;
        self.calls.push(CompositorCall::AbortTransaction { txn });
        Ok(())
    }

    fn add_element(
        &mut self,
        txn: TxnHandle,
        desc: ElementDesc,
    ) -> Result<ElementHandle, CompositorError> {
        self.check_elements_allowed(txn)?;
        let element = self.inner.add_element(txn, desc)?;
        self.calls.push(CompositorCall::AddElement { txn, element, desc });
        Ok(element)
    }

    fn remove_element(
        &mut self,
        txn: TxnHandle,
        element: ElementHandle,
    ) -> Result<(), CompositorError> {
        self.check_elements_allowed(txn)?;
        self.inner.remove_element(txn, element)?;
        self.calls.push(CompositorCall::RemoveElement { txn, element });
        Ok(())
    }

    fn change_element_source(
        &mut self,
        txn: TxnHandle,
        element: ElementHandle,
        resource: ResourceHandle,
    ) -> Result<(), CompositorError> {
        self.check_elements_allowed(txn)?;
        self.inner.change_element_source(txn, element, resource)?;
        self.calls.push(CompositorCall::ChangeElementSource {
            txn,
            element,
            resource,
        });
        Ok(())
    }
}
