use interface::{TradeLogResponse, TradeRecord};

use super::{ExitDetail, TradeDelta, TradeEvent, TradeId, TradeKind};

/// 서버 TradeRecord 를 TradeEvent 로 변환
/// 필드가 비거나 깨져 있으면 필드 단위 기본값으로 채운다 (레코드 자체는 버리지 않음).
pub fn trade_event_from_record(kind: TradeKind, record: &TradeRecord) -> TradeEvent {
    let timestamp = record
        .time
        .clone()
        .or_else(|| record.timestamp.clone())
        .unwrap_or_default();
    let name = record
        .name
        .clone()
        .or_else(|| record.stk_nm.clone())
        .unwrap_or_else(|| "-".to_string());
    let quantity = record.qty.unwrap_or(0.0);
    let price = record.price.or(record.avg_price).unwrap_or(0.0);

    let id = extract_trade_id(record, &timestamp, &name);

    let exit = match kind {
        TradeKind::Entry => None,
        TradeKind::Exit => Some(ExitDetail {
            reason: record.reason.clone().unwrap_or_default(),
            yield_percent: record.yield_rate.or(record.profit_rate).unwrap_or(0.0),
        }),
    };

    TradeEvent {
        id,
        kind,
        timestamp,
        name,
        code: record.stk_cd.clone(),
        quantity,
        price,
        exit,
    }
}

/// 서버 응답 전체를 TradeDelta 로 변환
pub fn delta_from_response(response: &TradeLogResponse) -> TradeDelta {
    let entries = response
        .buys
        .iter()
        .flatten()
        .map(|r| trade_event_from_record(TradeKind::Entry, r))
        .collect();
    let exits = response
        .sells
        .iter()
        .flatten()
        .map(|r| trade_event_from_record(TradeKind::Exit, r))
        .collect();

    TradeDelta {
        entries,
        exits,
        stats: response.stats.clone(),
    }
}

/// 양의 정수 ID 만 서버 ID 로 인정 (0 은 "없음"으로 본다)
fn extract_trade_id(record: &TradeRecord, timestamp: &str, name: &str) -> TradeId {
    if let Some(id) = record.id {
        if id >= 1.0 && id.fract() == 0.0 && id <= u64::MAX as f64 {
            return TradeId::Server(id as u64);
        }
    }

    let qty = match record.qty {
        Some(q) if q.fract() == 0.0 => format!("{}", q as i64),
        Some(q) => format!("{}", q),
        None => "-".to_string(),
    };
    TradeId::Composite(format!("{}_{}_{}", timestamp, name, qty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> TradeRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_exit_fields_fall_back_between_aliases() {
        let r = record(
            r#"{"id": 9, "timestamp": "2025-12-21 10:00:00", "stk_nm": "카카오", "qty": "2",
                "avg_price": "41,000", "profit_rate": -1.2, "reason": "TimeCut(100분)"}"#,
        );
        let e = trade_event_from_record(TradeKind::Exit, &r);

        assert_eq!(e.id, TradeId::Server(9));
        assert_eq!(e.timestamp, "2025-12-21 10:00:00");
        assert_eq!(e.name, "카카오");
        assert_eq!(e.price, 41000.0);
        assert_eq!(e.reason(), Some("TimeCut(100분)"));
        assert_eq!(e.yield_percent(), Some(-1.2));
    }

    #[test]
    fn test_composite_identity_when_id_missing() {
        let r = record(r#"{"time": "2025-12-21 10:00:00", "name": "LG", "qty": 3}"#);
        let e = trade_event_from_record(TradeKind::Entry, &r);
        assert_eq!(
            e.id,
            TradeId::Composite("2025-12-21 10:00:00_LG_3".to_string())
        );
        assert!(e.exit.is_none());

        // id 0 도 서버 ID 로 보지 않는다
        let zero = record(r#"{"id": 0, "time": "t", "qty": 1}"#);
        assert_eq!(
            trade_event_from_record(TradeKind::Entry, &zero).id,
            TradeId::Composite("t_-_1".to_string())
        );
    }

    #[test]
    fn test_identity_is_stable_across_fetches() {
        let raw = r#"{"time": "2025-12-21 10:00:00", "name": "LG", "qty": 3, "price": 100}"#;
        let a = trade_event_from_record(TradeKind::Entry, &record(raw));
        let b = trade_event_from_record(TradeKind::Entry, &record(raw));
        assert_eq!(a.id, b.id);
    }
}
