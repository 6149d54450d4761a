use serde::Serialize;

/// 표 한 칸 (텍스트 + 수익/손실 같은 분류)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Cell {
    pub text: String,
    pub class: Option<String>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: None,
        }
    }

    pub fn classed(text: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: Some(class.into()),
        }
    }
}

/// key 로 식별되는 표 한 줄. 같은 surface 의 행은 열 개수가 같다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub key: String,
    pub cells: Vec<Cell>,
}

impl RenderedRow {
    pub fn new(key: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }
}

/// 행 단위 갱신을 받는 화면
///
/// 실제로 무엇을 그리는지는 구현체 몫이다. placeholder 가 보이는 동안에는 key 가 있는 행이 없다.
pub trait DisplaySurface {
    /// 현재 그려진 행 (위에서 아래 순서)
    fn rendered(&self) -> Vec<RenderedRow>;
    /// 지금 보이는 "데이터 없음" 문구
    fn placeholder(&self) -> Option<&str>;

    fn show_placeholder(&mut self, message: &str);
    fn clear_placeholder(&mut self);
    fn insert(&mut self, position: usize, row: RenderedRow);
    fn relocate(&mut self, key: &str, position: usize);
    fn remove(&mut self, key: &str);
    fn write_cell(&mut self, key: &str, index: usize, cell: Cell);
}

/// surface 에 가해진 조작 횟수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceCounters {
    pub created: usize,
    pub moved: usize,
    pub removed: usize,
    pub cell_writes: usize,
    pub placeholder_shown: usize,
}

impl SurfaceCounters {
    pub fn structural(&self) -> usize {
        self.created + self.moved + self.removed
    }
}

/// 메모리 표. 터미널 출력과 테스트에서 쓴다.
#[derive(Debug, Default, Clone)]
pub struct TableSurface {
    rows: Vec<RenderedRow>,
    placeholder: Option<String>,
    counters: SurfaceCounters,
}

impl TableSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이미 그려진 상태에서 시작 (조작 횟수는 0)
    pub fn with_rows(rows: Vec<RenderedRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> &[RenderedRow] {
        &self.rows
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    pub fn counters(&self) -> SurfaceCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = SurfaceCounters::default();
    }

    /// 화면을 통째로 비운다 (재구성 전)
    pub fn clear(&mut self) {
        self.rows.clear();
        self.placeholder = None;
    }

    fn position_of(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.key == key)
    }
}

impl DisplaySurface for TableSurface {
    fn rendered(&self) -> Vec<RenderedRow> {
        self.rows.clone()
    }

    fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    fn show_placeholder(&mut self, message: &str) {
        self.rows.clear();
        self.placeholder = Some(message.to_string());
        self.counters.placeholder_shown += 1;
    }

    fn clear_placeholder(&mut self) {
        self.placeholder = None;
    }

    fn insert(&mut self, position: usize, row: RenderedRow) {
        let position = position.min(self.rows.len());
        self.rows.insert(position, row);
        self.counters.created += 1;
    }

    fn relocate(&mut self, key: &str, position: usize) {
        if let Some(from) = self.position_of(key) {
            let row = self.rows.remove(from);
            let position = position.min(self.rows.len());
            self.rows.insert(position, row);
            self.counters.moved += 1;
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(at) = self.position_of(key) {
            self.rows.remove(at);
            self.counters.removed += 1;
        }
    }

    fn write_cell(&mut self, key: &str, index: usize, cell: Cell) {
        if let Some(at) = self.position_of(key) {
            let cells = &mut self.rows[at].cells;
            if index >= cells.len() {
                cells.resize(index + 1, Cell::default());
            }
            cells[index] = cell;
            self.counters.cell_writes += 1;
        }
    }
}
