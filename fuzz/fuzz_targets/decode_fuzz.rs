#![no_main]

use libfuzzer_sys::fuzz_target;
use rsdir::{ExternalizerTable, IndexScoped, KeyMapper};

// 任意字节解码：要么返回错误，要么得到的 key 可以重新编码并解码回同一个 key
fuzz_target!(|data: &[u8]| {
    let table = ExternalizerTable::default();
    if let Ok(key) = table.decode(data) {
        // varint 允许非最短编码，所以只比较 key 而不比较字节
        let encoded = table.encode(&key).expect("decoded key must re-encode");
        let again = table.decode(&encoded).expect("re-encoded key must decode");
        assert_eq!(again, key);
        assert_eq!(again.affinity_segment_id(), key.affinity_segment_id());

        // 名字里含分隔符时字段数不符，解析必然失败；解析成功则必须可逆
        let mapper = KeyMapper::new();
        if let Ok(parsed) = mapper.key_mapping(&mapper.string_mapping(&key)) {
            assert_eq!(parsed, key);
        }
    }
});
