use std::cmp::Ordering;

use thiserror::Error;

/// 插入點，可能帶有選取範圍。 / An insertion point, optionally covering a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caret {
    position: usize,
    selection: Option<Selection>,
}

impl Caret {
    /// 建立指定位置的游標。 / Creates a caret at the given byte offset.
    pub fn new(position: usize) -> Self {
        Self {
            position,
            selection: None,
        }
    }

    /// 建立覆蓋選取範圍的游標，游標停在範圍結尾。 / Creates a caret covering `selection`, placed at its end.
    pub fn selecting(selection: Selection) -> Self {
        Self {
            position: selection.end,
            selection: Some(selection),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    fn edit_range(&self) -> (usize, usize) {
        match &self.selection {
            Some(selection) => (selection.start, selection.end),
            None => (self.position, self.position),
        }
    }

    fn collapse_to(&mut self, position: usize) {
        self.position = position;
        self.selection = None;
    }
}

/// 已排序（start <= end）的位元組範圍。 / Ordered byte range inside the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    start: usize,
    end: usize,
}

impl Selection {
    /// 自動排序起訖點。 / Bounds are ordered automatically.
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 編輯緩衝區錯誤。 / Error conditions exposed by the editing buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("caret index {index} is out of bounds for buffer of length {len}")]
    CaretOutOfBounds { index: usize, len: usize },
    #[error("caret {index} does not sit on a character boundary")]
    NotCharBoundary { index: usize },
    #[error("caret selections overlap and cannot be applied safely")]
    OverlappingCarets,
}

/// 接收貼上內容的編輯器端點。 / Editor side that receives a pasted payload.
///
/// Implementations insert `payload` at every cursor, or replace every current
/// selection; each selection is replaced independently of the others.
pub trait EditorInsertion {
    fn insert_payload(&mut self, payload: &str) -> Result<(), EditorError>;
}

/// 支援多重游標的文字緩衝。 / Text buffer supporting multi-caret insertion.
#[derive(Debug, Clone)]
pub struct EditorBuffer {
    contents: String,
    carets: Vec<Caret>,
}

impl EditorBuffer {
    /// 建立緩衝區，預設單一游標於文件結尾。 / Creates a buffer with one caret at the end of the text.
    pub fn new(text: impl Into<String>) -> Self {
        let contents = text.into();
        let end = contents.len();
        Self {
            contents,
            carets: vec![Caret::new(end)],
        }
    }

    /// 以指定游標建立緩衝區。 / Creates a buffer with explicit carets.
    pub fn with_carets(text: impl Into<String>, carets: Vec<Caret>) -> Result<Self, EditorError> {
        let buffer = Self {
            contents: text.into(),
            carets,
        };
        buffer.validate_carets(&buffer.carets)?;
        Ok(buffer)
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn into_contents(self) -> String {
        self.contents
    }

    pub fn carets(&self) -> &[Caret] {
        &self.carets
    }

    /// 以新的游標集合取代現有游標。 / Replaces the caret list.
    pub fn set_carets(&mut self, carets: Vec<Caret>) -> Result<(), EditorError> {
        self.validate_carets(&carets)?;
        self.carets = carets;
        Ok(())
    }

    fn validate_carets(&self, carets: &[Caret]) -> Result<(), EditorError> {
        let len = self.contents.len();
        let mut spans: Vec<(usize, usize)> = Vec::with_capacity(carets.len());
        for (index, caret) in carets.iter().enumerate() {
            let (start, end) = caret.edit_range();
            if start > len || end > len || caret.position() > len {
                return Err(EditorError::CaretOutOfBounds { index, len });
            }
            if !self.contents.is_char_boundary(start) || !self.contents.is_char_boundary(end) {
                return Err(EditorError::NotCharBoundary { index });
            }
            spans.push((start, end));
        }
        spans.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        for window in spans.windows(2) {
            if window[0].1 > window[1].0 {
                return Err(EditorError::OverlappingCarets);
            }
        }
        Ok(())
    }
}

impl EditorInsertion for EditorBuffer {
    fn insert_payload(&mut self, payload: &str) -> Result<(), EditorError> {
        self.validate_carets(&self.carets)?;

        // 由前往後套用，並累計位移。 / Apply front to back while tracking the shift.
        let mut order: Vec<usize> = (0..self.carets.len()).collect();
        order.sort_by(|&a, &b| {
            let (left_start, left_end) = self.carets[a].edit_range();
            let (right_start, right_end) = self.carets[b].edit_range();
            match left_start.cmp(&right_start) {
                Ordering::Equal => left_end.cmp(&right_end),
                other => other,
            }
        });

        let mut offset: isize = 0;
        let mut new_positions = vec![0; self.carets.len()];
        for &index in &order {
            let (start, end) = self.carets[index].edit_range();
            let adjusted_start = (start as isize + offset) as usize;
            let adjusted_end = (end as isize + offset) as usize;
            self.contents
                .replace_range(adjusted_start..adjusted_end, payload);
            offset += payload.len() as isize - (end - start) as isize;
            new_positions[index] = adjusted_start + payload.len();
        }

        for (caret, position) in self.carets.iter_mut().zip(new_positions) {
            caret.collapse_to(position);
        }
        Ok(())
    }
}
